use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use super::client::RemoteClient;
use crate::application::ports::NotificationGateway;
use crate::domain::entities::{MarkReadOutcome, NotificationBody, NotificationRecipientRow};
use crate::shared::error::AppError;

const RECIPIENTS_TABLE: &str = "notification_recipients";
const NOTIFICATIONS_TABLE: &str = "notifications";

#[async_trait]
impl NotificationGateway for RemoteClient {
    async fn recipients_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<NotificationRecipientRow>, AppError> {
        let url = self.rest_url(RECIPIENTS_TABLE);
        let user_filter = format!("eq.{user_id}");
        let response = self
            .authed(self.http.get(&url))
            .await
            .query(&[
                ("select", "id,user_id,notification_id,sent_at,read_at"),
                ("user_id", user_filter.as_str()),
            ])
            .send()
            .await?;
        let rows = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn notifications_by_ids(
        &self,
        ids: &[String],
    ) -> Result<Vec<NotificationBody>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.rest_url(NOTIFICATIONS_TABLE);
        let id_filter = format!("in.({})", ids.join(","));
        let response = self
            .authed(self.http.get(&url))
            .await
            .query(&[
                ("select", "id,title,message,created_at"),
                ("id", id_filter.as_str()),
            ])
            .send()
            .await?;
        let rows = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn unread_count(&self, user_id: &str) -> Result<u64, AppError> {
        let url = self.rest_url(RECIPIENTS_TABLE);
        let user_filter = format!("eq.{user_id}");
        let response = self
            .authed(self.http.get(&url))
            .await
            .query(&[
                ("select", "id"),
                ("user_id", user_filter.as_str()),
                ("read_at", "is.null"),
                ("limit", "1"),
            ])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;

        // PostgREST reports the exact count after the '/' in Content-Range.
        let from_header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next().map(str::to_string));
        if let Some(total) = from_header {
            if let Ok(count) = total.parse::<u64>() {
                return Ok(count);
            }
        }
        let rows: Vec<Value> = response.json().await?;
        Ok(rows.len() as u64)
    }

    async fn mark_read(&self, recipient_id: &str) -> Result<MarkReadOutcome, AppError> {
        let url = self.rest_url(RECIPIENTS_TABLE);
        let id_filter = format!("eq.{recipient_id}");
        let now = Utc::now();
        let response = self
            .authed(self.http.patch(&url))
            .await
            .query(&[("id", id_filter.as_str()), ("read_at", "is.null")])
            .header("Prefer", "return=representation")
            .json(&json!({ "read_at": now.to_rfc3339() }))
            .send()
            .await?;
        let rows: Vec<Map<String, Value>> = Self::check(response).await?.json().await?;

        // No row updated means someone already marked it read.
        if rows.is_empty() {
            return Ok(MarkReadOutcome::AlreadyRead);
        }
        let read_at = rows[0]
            .get("read_at")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(now);
        Ok(MarkReadOutcome::Updated { read_at })
    }
}
