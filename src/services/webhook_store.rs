use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::webhook::WebhookSubscription;
use crate::models::webhook_log::NewWebhookLog;

/// Persistence the delivery service depends on.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn find_active_subscriptions(
        &self,
        form_id: Uuid,
        event: &str,
    ) -> Result<Vec<WebhookSubscription>>;

    async fn append_delivery_log(&self, entry: NewWebhookLog) -> Result<()>;
}

#[derive(Clone)]
pub struct PgWebhookStore {
    pool: PgPool,
}

impl PgWebhookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookStore for PgWebhookStore {
    async fn find_active_subscriptions(
        &self,
        form_id: Uuid,
        event: &str,
    ) -> Result<Vec<WebhookSubscription>> {
        let rows = sqlx::query_as::<_, WebhookSubscription>(
            r#"SELECT id, form_id, url, secret, events, active, created_at, updated_at
               FROM webhooks
               WHERE form_id = $1 AND active = TRUE AND $2 = ANY(events)
               ORDER BY created_at ASC"#,
        )
        .bind(form_id)
        .bind(event)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn append_delivery_log(&self, entry: NewWebhookLog) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO webhook_logs
                 (webhook_id, response_id, event_type, attempt, http_status,
                  response_body, error_message, request_body, success)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(entry.webhook_id)
        .bind(entry.response_id)
        .bind(entry.event_type)
        .bind(entry.attempt)
        .bind(entry.http_status)
        .bind(entry.response_body)
        .bind(entry.error_message)
        .bind(entry.request_body)
        .bind(entry.success)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
