pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{
    delivery_service::DeliveryService, form_service::FormService,
    webhook_service::WebhookService, webhook_store::PgWebhookStore,
};

#[derive(Clone)]
pub struct AppState {
    pub form_service: FormService,
    pub webhook_service: WebhookService,
    pub delivery_service: DeliveryService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store = Arc::new(PgWebhookStore::new(pool.clone()));

        Self {
            form_service: FormService::new(pool.clone()),
            webhook_service: WebhookService::new(pool),
            delivery_service: DeliveryService::new(store),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/forms/:id/responses",
            post(routes::responses::submit_response),
        )
        .route(
            "/api/forms/:id/analytics",
            get(routes::analytics::get_form_analytics),
        )
        .route(
            "/api/forms/:id/webhooks",
            get(routes::webhooks::list_webhooks).post(routes::webhooks::create_webhook),
        )
        .route(
            "/api/webhooks/:id",
            patch(routes::webhooks::update_webhook).delete(routes::webhooks::delete_webhook),
        )
        .route(
            "/api/webhooks/:id/deliveries",
            get(routes::webhooks::list_deliveries),
        )
        .route("/api/webhooks/:id/test", post(routes::webhooks::test_webhook))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
