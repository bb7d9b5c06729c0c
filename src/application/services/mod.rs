pub mod auth_service;
pub mod notification_service;
pub mod photo_service;
pub mod pin_service;
pub mod sync_service;

pub use auth_service::AuthService;
pub use notification_service::NotificationService;
pub use photo_service::{PhotoService, UploadError};
pub use pin_service::{PinGate, PinStatus, PinVerification};
pub use sync_service::SyncEngine;
