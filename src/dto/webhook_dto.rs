use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    field::Field,
    form::Form,
    response::Response,
    webhook::{WebhookEvent, WebhookSubscription},
};
use crate::utils::validation::{validate_event_names, validate_webhook_url};

/// Body of every outbound webhook request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub timestamp: String,
    pub data: WebhookResponseData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponseData {
    pub form_id: Uuid,
    pub form_title: String,
    pub response_id: Uuid,
    pub respondent_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub answers: Vec<WebhookAnswer>,
    pub metadata: WebhookMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAnswer {
    pub field_id: Uuid,
    pub field_title: String,
    pub field_type: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub time_taken: Option<i32>,
}

impl WebhookPayload {
    /// Builds the envelope for `response`, listing answers in field order.
    /// Answers pointing at fields that no longer exist are skipped.
    pub fn for_response(event: &str, form: &Form, fields: &[Field], response: &Response) -> Self {
        let mut ordered: Vec<&Field> = fields.iter().collect();
        ordered.sort_by_key(|f| f.position);

        let answers = ordered
            .into_iter()
            .filter_map(|field| {
                response
                    .answers
                    .iter()
                    .find(|a| a.field_id == field.id)
                    .map(|a| WebhookAnswer {
                        field_id: field.id,
                        field_title: field.title.clone(),
                        field_type: field.field_type.clone(),
                        value: a.value.clone(),
                    })
            })
            .collect();

        Self {
            event: event.to_string(),
            timestamp: crate::utils::time::to_rfc3339(crate::utils::time::now()),
            data: WebhookResponseData {
                form_id: form.id,
                form_title: form.title.clone(),
                response_id: response.id,
                respondent_id: response.respondent_id.clone(),
                completed_at: response.completed_at,
                answers,
                metadata: WebhookMetadata {
                    ip: response.ip_address.clone(),
                    user_agent: response.user_agent.clone(),
                    time_taken: response.time_taken,
                },
            },
        }
    }

    /// Sample envelope for manual pings; it references no stored response.
    pub fn test_ping(form: &Form) -> Self {
        Self {
            event: WebhookEvent::Test.as_str().to_string(),
            timestamp: crate::utils::time::to_rfc3339(crate::utils::time::now()),
            data: WebhookResponseData {
                form_id: form.id,
                form_title: form.title.clone(),
                response_id: Uuid::nil(),
                respondent_id: None,
                completed_at: Some(crate::utils::time::now()),
                answers: Vec::new(),
                metadata: WebhookMetadata {
                    ip: None,
                    user_agent: None,
                    time_taken: None,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebhookPayload {
    #[validate(custom(function = "validate_webhook_url"))]
    pub url: String,
    #[validate(custom(function = "validate_event_names"))]
    pub events: Vec<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWebhookPayload {
    #[validate(custom(function = "validate_webhook_url"))]
    pub url: Option<String>,
    #[validate(custom(function = "validate_event_names"))]
    pub events: Option<Vec<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryLogQuery {
    pub limit: Option<i64>,
}

/// Returned once, from the create call; the secret is write-only afterwards.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWebhookResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    pub secret: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub id: Uuid,
    pub form_id: Uuid,
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<WebhookSubscription> for WebhookResponse {
    fn from(w: WebhookSubscription) -> Self {
        Self {
            id: w.id,
            form_id: w.form_id,
            url: w.url,
            events: w.events,
            active: w.active,
            created_at: w.created_at,
        }
    }
}

impl From<WebhookSubscription> for CreatedWebhookResponse {
    fn from(w: WebhookSubscription) -> Self {
        let secret = w.secret.clone();
        Self {
            webhook: WebhookResponse::from(w),
            secret,
        }
    }
}
