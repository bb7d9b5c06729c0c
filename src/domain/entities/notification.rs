use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw recipient row as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecipientRow {
    pub id: String,
    pub user_id: String,
    pub notification_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Notification body joined in by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationBody {
    pub id: String,
    pub title: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Normalized notification as handed to the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: String,
    pub notification_id: Option<String>,
    pub title: String,
    pub message: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarkReadOutcome {
    Updated { read_at: DateTime<Utc> },
    AlreadyRead,
}
