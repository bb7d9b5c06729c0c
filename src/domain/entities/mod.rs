pub mod credential;
pub mod identity;
pub mod notification;
pub mod pending_record;
pub mod sync_report;

pub use credential::OfflineCredential;
pub use identity::{AgentProfile, Identity, SessionUser};
pub use notification::{MarkReadOutcome, Notification, NotificationBody, NotificationRecipientRow};
pub use pending_record::{is_local_photo_uri, PendingRecord, SyncMeta, PHOTO_FIELD};
pub use sync_report::{EngineStatus, SkipReason, SyncMode, SyncOutcome, SyncReport};
