use async_trait::async_trait;

/// Network reachability probe supplied by the shell.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_connected(&self) -> bool;
}
