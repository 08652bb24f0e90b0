use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{error::Result, services::analytics_service::AnalyticsService, AppState};

#[axum::debug_handler]
pub async fn get_form_analytics(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.form_service.get_form(form_id).await?;
    let fields = state.form_service.list_fields(form_id).await?;
    let responses = state.form_service.list_responses(form_id).await?;
    let analytics = AnalyticsService::calculate(&responses, &fields);
    Ok(Json(analytics))
}
