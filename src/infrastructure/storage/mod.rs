pub mod credential_store;
pub mod identity_cache;
pub mod photo_store;
pub mod record_store;

pub use credential_store::CredentialStore;
pub use identity_cache::IdentityCache;
pub use photo_store::PhotoStore;
pub use record_store::FileRecordStore;
