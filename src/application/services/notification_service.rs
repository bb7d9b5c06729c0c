use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::application::ports::NotificationGateway;
use crate::domain::entities::{MarkReadOutcome, Notification, NotificationRecipientRow};
use crate::shared::error::AppError;

const DEFAULT_TITLE: &str = "Notification";

/// Read-side of user notifications: join recipient rows with their bodies,
/// normalize, and keep the unread badge count fresh.
pub struct NotificationService {
    gateway: Arc<dyn NotificationGateway>,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn NotificationGateway>) -> Self {
        Self { gateway }
    }

    /// All notifications addressed to the user, newest first.
    pub async fn fetch_for_user(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        if user_id.is_empty() {
            return Err(AppError::InvalidInput(
                "A user is required to query notifications".to_string(),
            ));
        }

        let recipients = self.gateway.recipients_for(user_id).await?;
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = recipients
            .iter()
            .filter_map(|row| row.notification_id.clone())
            .collect();
        ids.sort();
        ids.dedup();

        let bodies = self.gateway.notifications_by_ids(&ids).await?;
        let by_id: HashMap<_, _> = bodies.into_iter().map(|b| (b.id.clone(), b)).collect();
        debug!(
            "Fetched {} notification(s) for user {user_id}",
            recipients.len()
        );

        let mut notifications: Vec<Notification> = recipients
            .into_iter()
            .map(|row| {
                let body = row.notification_id.as_ref().and_then(|id| by_id.get(id));
                normalize(row, body)
            })
            .collect();
        notifications.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u64, AppError> {
        if user_id.is_empty() {
            return Ok(0);
        }
        self.gateway.unread_count(user_id).await
    }

    pub async fn mark_read(&self, recipient_id: &str) -> Result<MarkReadOutcome, AppError> {
        if recipient_id.is_empty() {
            return Err(AppError::InvalidInput(
                "A recipient id is required".to_string(),
            ));
        }
        self.gateway.mark_read(recipient_id).await
    }
}

fn normalize(
    row: NotificationRecipientRow,
    body: Option<&crate::domain::entities::NotificationBody>,
) -> Notification {
    let title = body
        .and_then(|b| b.title.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();
    let message = body
        .and_then(|b| b.message.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let sent_at = row.sent_at.or_else(|| body.and_then(|b| b.created_at));

    Notification {
        recipient_id: row.id,
        notification_id: row.notification_id,
        title,
        message,
        sent_at,
        read_at: row.read_at,
    }
}
