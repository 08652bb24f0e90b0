use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Uuid,
    pub form_id: Uuid,
    pub respondent_id: Option<String>,
    pub completed: bool,
    /// Seconds between the first screen and submission, as reported by the client.
    pub time_taken: Option<i32>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Uuid,
    pub response_id: Uuid,
    pub field_id: Uuid,
    pub value: JsonValue,
}
