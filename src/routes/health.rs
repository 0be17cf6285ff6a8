use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub result_store: ResultStoreHealth,
    pub rate_limiter: RateLimiterHealth,
}

#[derive(Serialize)]
pub struct ResultStoreHealth {
    pub records: usize,
}

#[derive(Serialize)]
pub struct RateLimiterHealth {
    pub requests_in_window: u32,
    pub window_remaining_secs: u64,
}

/// GET /health — liveness plus in-memory component introspection.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.limiter.snapshot(std::time::Instant::now());

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            result_store: ResultStoreHealth {
                records: state.results.len(),
            },
            rate_limiter: RateLimiterHealth {
                requests_in_window: snapshot.requests_in_window,
                window_remaining_secs: snapshot.window_remaining_secs,
            },
        },
    })
}
