#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Router};
use chrono::Utc;
use forms_backend::dto::webhook_dto::WebhookPayload;
use forms_backend::error::{Error, Result};
use forms_backend::models::field::Field;
use forms_backend::models::form::Form;
use forms_backend::models::response::{Answer, Response};
use forms_backend::models::webhook::WebhookSubscription;
use forms_backend::models::webhook_log::NewWebhookLog;
use forms_backend::services::delivery_service::RetryPolicy;
use forms_backend::services::webhook_store::WebhookStore;
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    pub subscriptions: Mutex<Vec<WebhookSubscription>>,
    pub logs: Mutex<Vec<NewWebhookLog>>,
    pub fail_lookup: bool,
    /// Writing a log for this subscription panics the calling task.
    pub panic_on_log_for: Option<Uuid>,
}

impl MemoryStore {
    pub fn with_subscriptions(subs: Vec<WebhookSubscription>) -> Self {
        Self {
            subscriptions: Mutex::new(subs),
            ..Default::default()
        }
    }

    pub fn logs(&self) -> Vec<NewWebhookLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn find_active_subscriptions(
        &self,
        form_id: Uuid,
        event: &str,
    ) -> Result<Vec<WebhookSubscription>> {
        if self.fail_lookup {
            return Err(Error::Internal("store offline".into()));
        }
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.form_id == form_id && s.accepts(event))
            .cloned()
            .collect())
    }

    async fn append_delivery_log(&self, entry: NewWebhookLog) -> Result<()> {
        if self.panic_on_log_for == Some(entry.webhook_id) {
            panic!("log sink exploded for {}", entry.webhook_id);
        }
        self.logs.lock().unwrap().push(entry);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

/// Local endpoint that answers with queued status codes, then `fallback`.
pub struct Receiver {
    statuses: Mutex<VecDeque<u16>>,
    fallback: u16,
    delay: Duration,
    reply_body: String,
    requests: Mutex<Vec<CapturedRequest>>,
}

impl Receiver {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn receive(
    State(receiver): State<Arc<Receiver>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    receiver
        .requests
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, body });
    let status = receiver
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(receiver.fallback);
    if !receiver.delay.is_zero() {
        tokio::time::sleep(receiver.delay).await;
    }
    (StatusCode::from_u16(status).unwrap(), receiver.reply_body.clone())
}

pub async fn spawn_receiver(queued: Vec<u16>, fallback: u16, delay: Duration) -> (String, Arc<Receiver>) {
    spawn_receiver_with_body(queued, fallback, delay, String::new()).await
}

pub async fn spawn_receiver_with_body(
    queued: Vec<u16>,
    fallback: u16,
    delay: Duration,
    reply_body: String,
) -> (String, Arc<Receiver>) {
    let receiver = Arc::new(Receiver {
        statuses: Mutex::new(queued.into()),
        fallback,
        delay,
        reply_body,
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/hook", post(receive))
        .with_state(receiver.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind receiver");
    let addr = listener.local_addr().expect("receiver addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("receiver server");
    });
    (format!("http://{}/hook", addr), receiver)
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: vec![Duration::from_millis(10); 3],
        timeout: Duration::from_secs(5),
    }
}

pub fn subscription(form_id: Uuid, url: &str, events: &[&str], active: bool) -> WebhookSubscription {
    WebhookSubscription {
        id: Uuid::new_v4(),
        form_id,
        url: url.to_string(),
        secret: forms_backend::utils::signature::new_secret(),
        events: events.iter().map(|e| e.to_string()).collect(),
        active,
        created_at: Some(Utc::now()),
        updated_at: None,
    }
}

pub fn sample_payload(form_id: Uuid) -> (WebhookPayload, Uuid) {
    let form = Form {
        id: form_id,
        title: "Customer survey".into(),
        description: None,
        created_at: Some(Utc::now()),
    };
    let rating = Field {
        id: Uuid::new_v4(),
        form_id,
        title: "How was it?".into(),
        field_type: "rating".into(),
        position: 1,
        required: true,
        properties: None,
    };
    let name = Field {
        id: Uuid::new_v4(),
        form_id,
        title: "Name".into(),
        field_type: "short_text".into(),
        position: 0,
        required: false,
        properties: None,
    };
    let response_id = Uuid::new_v4();
    let response = Response {
        id: response_id,
        form_id,
        respondent_id: Some("resp-1".into()),
        completed: true,
        time_taken: Some(42),
        ip_address: Some("203.0.113.7".into()),
        user_agent: Some("tests".into()),
        created_at: Utc::now(),
        completed_at: Some(Utc::now()),
        answers: vec![
            Answer {
                id: Uuid::new_v4(),
                response_id,
                field_id: rating.id,
                value: json!(5),
            },
            Answer {
                id: Uuid::new_v4(),
                response_id,
                field_id: name.id,
                value: json!("Ada"),
            },
        ],
    };
    let payload = WebhookPayload::for_response("response.completed", &form, &[rating, name], &response);
    (payload, response_id)
}
