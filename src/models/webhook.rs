use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub form_id: Uuid,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WebhookSubscription {
    pub fn accepts(&self, event: &str) -> bool {
        self.active && self.events.iter().any(|e| e == event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEvent {
    ResponseCompleted,
    Test,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ResponseCompleted => "response.completed",
            WebhookEvent::Test => "webhook.test",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "response.completed" => Some(WebhookEvent::ResponseCompleted),
            "webhook.test" => Some(WebhookEvent::Test),
            _ => None,
        }
    }
}
