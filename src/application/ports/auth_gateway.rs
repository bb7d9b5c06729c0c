use crate::domain::entities::{AgentProfile, SessionUser};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AppError>;

    /// Agent profile row for the signed-in user, when one exists.
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<AgentProfile>, AppError>;
}
