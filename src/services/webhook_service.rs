use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::webhook_dto::{CreateWebhookPayload, UpdateWebhookPayload};
use crate::error::{Error, Result};
use crate::models::webhook::WebhookSubscription;
use crate::models::webhook_log::WebhookLog;
use crate::utils::signature;

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
}

impl WebhookService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, form_id: Uuid, payload: CreateWebhookPayload) -> Result<WebhookSubscription> {
        let secret = signature::new_secret();
        let webhook = sqlx::query_as::<_, WebhookSubscription>(
            r#"
            INSERT INTO webhooks (form_id, url, secret, events, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, form_id, url, secret, events, active, created_at, updated_at
            "#,
        )
        .bind(form_id)
        .bind(payload.url)
        .bind(secret)
        .bind(payload.events)
        .bind(payload.active.unwrap_or(true))
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(webhook_id = %webhook.id, form_id = %form_id, "webhook created");
        Ok(webhook)
    }

    pub async fn get(&self, id: Uuid) -> Result<WebhookSubscription> {
        sqlx::query_as::<_, WebhookSubscription>(
            r#"SELECT id, form_id, url, secret, events, active, created_at, updated_at
               FROM webhooks WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Webhook {} not found", id)))
    }

    pub async fn list_for_form(&self, form_id: Uuid) -> Result<Vec<WebhookSubscription>> {
        let rows = sqlx::query_as::<_, WebhookSubscription>(
            r#"SELECT id, form_id, url, secret, events, active, created_at, updated_at
               FROM webhooks WHERE form_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateWebhookPayload) -> Result<WebhookSubscription> {
        sqlx::query_as::<_, WebhookSubscription>(
            r#"
            UPDATE webhooks SET
                url = COALESCE($2, url),
                events = COALESCE($3, events),
                active = COALESCE($4, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, form_id, url, secret, events, active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payload.url)
        .bind(payload.events)
        .bind(payload.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Webhook {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Webhook {} not found", id)));
        }
        Ok(())
    }

    /// Most recent delivery attempts first.
    pub async fn list_logs(&self, webhook_id: Uuid, limit: Option<i64>) -> Result<Vec<WebhookLog>> {
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        let rows = sqlx::query_as::<_, WebhookLog>(
            r#"SELECT id, webhook_id, response_id, event_type, attempt, http_status,
                      response_body, error_message, request_body, success, created_at
               FROM webhook_logs
               WHERE webhook_id = $1
               ORDER BY created_at DESC
               LIMIT $2"#,
        )
        .bind(webhook_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
