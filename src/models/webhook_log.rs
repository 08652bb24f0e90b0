use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the append-only delivery audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLog {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub response_id: Option<Uuid>,
    pub event_type: String,
    pub attempt: i32,
    pub http_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub request_body: String,
    pub success: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookLog {
    pub webhook_id: Uuid,
    pub response_id: Option<Uuid>,
    pub event_type: String,
    pub attempt: i32,
    pub http_status: Option<i32>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub request_body: String,
    pub success: bool,
}
