pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use shared::config::AppConfig;
pub use shared::error::{AppError, Result};

/// Initialize tracing for binaries and long-running hosts embedding the
/// crate. Library callers that install their own subscriber skip this.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldkit=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
