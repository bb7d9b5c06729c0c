use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tokio::sync::RwLock;

use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;

/// HTTP client for the remote backend: record table (PostgREST-style),
/// object storage, and the password-grant auth endpoint share one base URL
/// and one API key. After sign-in the session token replaces the anon key as
/// the bearer credential.
pub struct RemoteClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) records_table: String,
    pub(crate) profiles_table: String,
    pub(crate) photos_bucket: String,
    pub(crate) photos_bucket_public: bool,
    access_token: RwLock<Option<String>>,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|err| {
                AppError::ConfigurationError(format!("Failed to build HTTP client: {err}"))
            })?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            records_table: config.records_table.clone(),
            profiles_table: config.profiles_table.clone(),
            photos_bucket: config.photos_bucket.clone(),
            photos_bucket_public: config.photos_bucket_public,
            access_token: RwLock::new(None),
        })
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn storage_url(&self, tail: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, tail)
    }

    pub(crate) fn auth_url(&self, tail: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, tail)
    }

    pub(crate) async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// Session token when signed in, anon key otherwise.
    async fn bearer(&self) -> String {
        self.access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    pub(crate) async fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer().await)
    }

    /// Non-2xx responses become `AppError::Network` carrying status and body.
    pub(crate) async fn check(response: Response) -> Result<Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Network(format!(
            "HTTP {} error: {}",
            status.as_u16(),
            body
        )))
    }
}
