use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod callback;
pub mod health;
pub mod metrics;

/// Webhook payloads are small JSON documents; images are fetched separately.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Routes served with the application state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/callback", post(callback::callback))
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
