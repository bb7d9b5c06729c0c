use crate::domain::entities::{MarkReadOutcome, NotificationBody, NotificationRecipientRow};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn recipients_for(&self, user_id: &str)
        -> Result<Vec<NotificationRecipientRow>, AppError>;

    async fn notifications_by_ids(&self, ids: &[String])
        -> Result<Vec<NotificationBody>, AppError>;

    async fn unread_count(&self, user_id: &str) -> Result<u64, AppError>;

    /// Idempotent: marking an already-read row reports `AlreadyRead`.
    async fn mark_read(&self, recipient_id: &str) -> Result<MarkReadOutcome, AppError>;
}
