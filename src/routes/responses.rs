use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::response_dto::{ClientInfo, SubmitResponsePayload},
    dto::webhook_dto::WebhookPayload,
    error::Result,
    models::webhook::WebhookEvent,
    AppState,
};

/// Stores a response. Completed responses fan out to webhooks in the
/// background; delivery never affects this request's outcome.
#[axum::debug_handler]
pub async fn submit_response(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SubmitResponsePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let form = state.form_service.get_form(form_id).await?;
    let fields = state.form_service.list_fields(form_id).await?;

    let response = state
        .form_service
        .submit_response(form_id, &fields, payload, client_info(&headers))
        .await?;

    if response.completed {
        let event = WebhookEvent::ResponseCompleted.as_str();
        let webhook_payload = WebhookPayload::for_response(event, &form, &fields, &response);
        let _detached = state
            .delivery_service
            .dispatch(form_id, event, webhook_payload, Some(response.id));
    }

    Ok((StatusCode::CREATED, Json(response)))
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    ClientInfo {
        ip: header("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip")),
        user_agent: header("user-agent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_info_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        let info = client_info(&headers);
        assert_eq!(info.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn client_info_is_empty_without_headers() {
        let info = client_info(&HeaderMap::new());
        assert!(info.ip.is_none());
        assert!(info.user_agent.is_none());
    }
}
