pub mod error;
pub mod health;
pub mod metrics;
pub mod stage;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// All API routes sharing [`AppState`]. The metrics scrape endpoint is added
/// separately since it carries its own state.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/stage", post(stage::submit_stage))
        .route("/stage/reimagine", post(stage::submit_stage_polled))
        .route(
            "/webhook-receiver",
            post(webhook::receive_callback).get(webhook::read_result),
        )
        .with_state(state)
}
