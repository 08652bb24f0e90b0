use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::webhook_dto::{
        CreateWebhookPayload, CreatedWebhookResponse, DeliveryLogQuery, UpdateWebhookPayload,
        WebhookPayload, WebhookResponse,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_webhook(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    Json(payload): Json<CreateWebhookPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.form_service.get_form(form_id).await?;
    let webhook = state.webhook_service.create(form_id, payload).await?;
    Ok((StatusCode::CREATED, Json(CreatedWebhookResponse::from(webhook))))
}

#[axum::debug_handler]
pub async fn list_webhooks(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let webhooks: Vec<WebhookResponse> = state
        .webhook_service
        .list_for_form(form_id)
        .await?
        .into_iter()
        .map(WebhookResponse::from)
        .collect();
    Ok(Json(webhooks))
}

#[axum::debug_handler]
pub async fn update_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWebhookPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let webhook = state.webhook_service.update(id, payload).await?;
    Ok(Json(WebhookResponse::from(webhook)))
}

#[axum::debug_handler]
pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.webhook_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn list_deliveries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeliveryLogQuery>,
) -> Result<impl IntoResponse> {
    state.webhook_service.get(id).await?;
    let logs = state.webhook_service.list_logs(id, query.limit).await?;
    Ok(Json(logs))
}

/// Sends a signed `webhook.test` ping and waits for the outcome, retries included.
#[axum::debug_handler]
pub async fn test_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let webhook = state.webhook_service.get(id).await?;
    let form = state.form_service.get_form(webhook.form_id).await?;
    let payload = WebhookPayload::test_ping(&form);
    let result = state
        .delivery_service
        .deliver(webhook.id, &webhook.url, &webhook.secret, &payload, None)
        .await;
    Ok(Json(result))
}
