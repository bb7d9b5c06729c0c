use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::client::RemoteClient;
use crate::application::ports::AuthGateway;
use crate::domain::entities::{AgentProfile, SessionUser};
use crate::shared::error::AppError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

#[async_trait]
impl AuthGateway for RemoteClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AppError> {
        let url = self.auth_url("token");
        let response = self
            .http
            .post(&url)
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = Self::check(response)
            .await
            .map_err(|err| AppError::Auth(err.to_string()))?
            .json()
            .await?;

        let display_name = token
            .user
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.set_access_token(Some(token.access_token)).await;

        Ok(SessionUser {
            id: token.user.id,
            email: token.user.email.unwrap_or_default(),
            display_name,
        })
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<AgentProfile>, AppError> {
        let url = self.rest_url(&self.profiles_table);
        let user_filter = format!("eq.{user_id}");
        let response = self
            .authed(self.http.get(&url))
            .await
            .query(&[
                ("select", "name,region"),
                ("user_id", user_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;
        let rows: Vec<AgentProfile> = Self::check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }
}
