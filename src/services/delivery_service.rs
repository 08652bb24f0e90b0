use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dto::webhook_dto::WebhookPayload;
use crate::models::webhook_log::NewWebhookLog;
use crate::services::webhook_store::WebhookStore;
use crate::utils::signature::{self, SignedHeaders};
use crate::utils::time::truncate_chars;

pub const MAX_ATTEMPTS: usize = 3;
pub const BACKOFF_SCHEDULE: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(5),
    Duration::from_secs(30),
];
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_LOGGED_BODY_CHARS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// Sleep after the n-th failed attempt, indexed from zero.
    pub backoff: Vec<Duration>,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: BACKOFF_SCHEDULE.to_vec(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    fn delay_after(&self, attempt_index: usize) -> Duration {
        self.backoff
            .get(attempt_index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub webhook_id: Uuid,
    pub result: DeliveryResult,
}

struct AttemptReport {
    status_code: Option<u16>,
    response_body: Option<String>,
    error_message: Option<String>,
}

impl AttemptReport {
    fn succeeded(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn WebhookStore>,
    client: Client,
    policy: RetryPolicy,
}

impl DeliveryService {
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self {
            store,
            client: Client::new(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends `payload` to `url`, retrying per the policy. Every attempt is
    /// appended to the delivery log; failures come back as data.
    pub async fn deliver(
        &self,
        webhook_id: Uuid,
        url: &str,
        secret: &str,
        payload: &WebhookPayload,
        response_id: Option<Uuid>,
    ) -> DeliveryResult {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => {
                error!(webhook_id = %webhook_id, error = %err, "failed to serialize webhook payload");
                return DeliveryResult {
                    success: false,
                    status_code: None,
                    response_body: None,
                    error_message: Some(format!("Failed to serialize payload: {}", err)),
                };
            }
        };
        let headers = signature::build_headers(body.as_bytes(), secret.as_bytes());
        let max_attempts = self.policy.max_attempts.max(1);

        let mut last = AttemptReport {
            status_code: None,
            response_body: None,
            error_message: None,
        };

        for attempt in 1..=max_attempts {
            let report = self.send_once(url, &body, &headers).await;
            let success = report.succeeded();

            self.record_attempt(NewWebhookLog {
                webhook_id,
                response_id,
                event_type: payload.event.clone(),
                attempt: attempt as i32,
                http_status: report.status_code.map(i32::from),
                response_body: report.response_body.clone(),
                error_message: report.error_message.clone(),
                request_body: body.clone(),
                success,
            })
            .await;

            if success {
                info!(webhook_id = %webhook_id, attempt, status = ?report.status_code, "webhook delivered");
                return DeliveryResult {
                    success: true,
                    status_code: report.status_code,
                    response_body: report.response_body,
                    error_message: None,
                };
            }

            warn!(
                webhook_id = %webhook_id,
                attempt,
                max_attempts,
                error = report.error_message.as_deref().unwrap_or_default(),
                "webhook delivery attempt failed"
            );
            last = report;

            if attempt < max_attempts {
                let delay = self.policy.delay_after(attempt - 1);
                debug!(webhook_id = %webhook_id, ?delay, "backing off before next attempt");
                tokio::time::sleep(delay).await;
            }
        }

        let message = format!(
            "Webhook delivery failed after {} attempts: {}",
            max_attempts,
            last.error_message.as_deref().unwrap_or("unknown error")
        );
        error!(webhook_id = %webhook_id, url, "{}", message);

        DeliveryResult {
            success: false,
            status_code: last.status_code,
            response_body: last.response_body,
            error_message: Some(message),
        }
    }

    /// Fans `payload` out to every active subscription of `form_id` that
    /// listens for `event`. Each delivery runs in its own task; the returned
    /// handle may be dropped to leave them running detached.
    pub fn dispatch(
        &self,
        form_id: Uuid,
        event: &str,
        payload: WebhookPayload,
        response_id: Option<Uuid>,
    ) -> JoinHandle<Vec<DispatchOutcome>> {
        let service = self.clone();
        let event = event.to_string();

        tokio::spawn(async move {
            let subscriptions = match service.store.find_active_subscriptions(form_id, &event).await {
                Ok(subs) => subs,
                Err(err) => {
                    error!(form_id = %form_id, event = %event, error = %err, "failed to load webhook subscriptions");
                    return Vec::new();
                }
            };
            if subscriptions.is_empty() {
                return Vec::new();
            }
            debug!(form_id = %form_id, event = %event, count = subscriptions.len(), "dispatching webhooks");

            let payload = Arc::new(payload);
            let handles: Vec<_> = subscriptions
                .into_iter()
                .map(|sub| {
                    let service = service.clone();
                    let payload = payload.clone();
                    let handle = tokio::spawn(async move {
                        service
                            .deliver(sub.id, &sub.url, &sub.secret, &payload, response_id)
                            .await
                    });
                    (sub.id, handle)
                })
                .collect();

            let mut outcomes = Vec::with_capacity(handles.len());
            for (webhook_id, handle) in handles {
                match handle.await {
                    Ok(result) => outcomes.push(DispatchOutcome { webhook_id, result }),
                    Err(err) => {
                        error!(webhook_id = %webhook_id, error = %err, "webhook delivery task did not complete")
                    }
                }
            }
            outcomes
        })
    }

    async fn send_once(&self, url: &str, body: &str, headers: &SignedHeaders) -> AttemptReport {
        let mut request = self.client.post(url).body(body.to_owned());
        for (name, value) in headers.to_pairs() {
            request = request.header(name, value);
        }

        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(self.policy.timeout, exchange).await {
            Ok(Ok((status, text))) => AttemptReport {
                status_code: Some(status),
                response_body: Some(truncate_chars(&text, MAX_LOGGED_BODY_CHARS)),
                error_message: if (200..300).contains(&status) {
                    None
                } else {
                    Some(format!("HTTP {}", status))
                },
            },
            Ok(Err(err)) => AttemptReport {
                status_code: None,
                response_body: None,
                error_message: Some(err.to_string()),
            },
            Err(_) => AttemptReport {
                status_code: None,
                response_body: None,
                error_message: Some(format!("Request timed out after {:?}", self.policy.timeout)),
            },
        }
    }

    async fn record_attempt(&self, entry: NewWebhookLog) {
        let webhook_id = entry.webhook_id;
        if let Err(err) = self.store.append_delivery_log(entry).await {
            warn!(webhook_id = %webhook_id, error = %err, "failed to write webhook delivery log");
        }
    }
}
