use async_trait::async_trait;
use serde_json::{Map, Value};

use super::client::RemoteClient;
use crate::application::ports::RecordTable;
use crate::shared::error::AppError;

#[async_trait]
impl RecordTable for RemoteClient {
    async fn upsert(&self, row: &Map<String, Value>) -> Result<(), AppError> {
        let url = self.rest_url(&self.records_table);
        let response = self
            .authed(self.http.post(&url))
            .await
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn select_page(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        let url = self.rest_url(&self.records_table);
        let user_filter = format!("eq.{user_id}");
        let offset = offset.to_string();
        let limit = limit.to_string();
        let response = self
            .authed(self.http.get(&url))
            .await
            .query(&[
                ("select", "*"),
                ("user_id", user_filter.as_str()),
                ("order", "activation_date.desc"),
                ("offset", offset.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let rows = Self::check(response).await?.json().await?;
        Ok(rows)
    }
}
