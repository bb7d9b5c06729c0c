use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Remote record store: upsert-by-id plus range-paginated select.
#[async_trait]
pub trait RecordTable: Send + Sync {
    /// Insert-or-overwrite keyed on the row's `id` column.
    async fn upsert(&self, row: &Map<String, Value>) -> Result<(), AppError>;

    /// Rows submitted by one user, newest activation date first.
    async fn select_page(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Map<String, Value>>, AppError>;
}
