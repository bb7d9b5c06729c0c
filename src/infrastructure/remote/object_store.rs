use async_trait::async_trait;
use serde_json::{json, Value};

use super::client::RemoteClient;
use crate::application::ports::ObjectStore;
use crate::shared::error::AppError;

#[async_trait]
impl ObjectStore for RemoteClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let path = path.trim_start_matches('/');
        let url = self.storage_url(&format!("object/{}/{}", self.photos_bucket, path));
        let response = self
            .authed(self.http.post(&url))
            .await
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn public_url(&self, path: &str) -> Result<Option<String>, AppError> {
        if !self.photos_bucket_public {
            return Ok(None);
        }
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.storage_url(&format!(
            "object/public/{}/{}",
            self.photos_bucket, path
        ))))
    }

    async fn signed_url(&self, path: &str, expires_secs: u64) -> Result<Option<String>, AppError> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(None);
        }
        let url = self.storage_url(&format!("object/sign/{}/{}", self.photos_bucket, path));
        let response = self
            .authed(self.http.post(&url))
            .await
            .json(&json!({ "expiresIn": expires_secs }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        Ok(body
            .get("signedURL")
            .and_then(Value::as_str)
            .map(|signed| format!("{}/storage/v1{}", self.base_url, signed)))
    }
}
