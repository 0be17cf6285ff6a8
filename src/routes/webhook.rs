use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use metrics::counter;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::models::job::JobStatus;
use crate::models::staging::{ResultQuery, StatusResponse, VendorCallback};

/// POST /webhook-receiver — staging vendor callback.
///
/// Always answers `200 {"status":"ok"}`, even for undecodable bodies or
/// internal failures, so the vendor never enters a retry loop on our
/// account.
pub async fn receive_callback(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    match serde_json::from_slice::<VendorCallback>(&body) {
        Ok(callback) => state.correlator.handle(callback).await,
        Err(e) => {
            counter!("staging_webhook_undecodable_total").increment(1);
            tracing::warn!(error = %e, "undecodable webhook callback body");
        }
    }

    Json(json!({ "status": "ok" }))
}

/// GET /webhook-receiver?request_id= — read a staged result.
///
/// An absent record means the job is still running; that is a normal
/// response, not an error.
pub async fn read_result(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
) -> Json<StatusResponse> {
    match state.results.get(&query.request_id) {
        Some(record) => Json(StatusResponse {
            success: true,
            status: record.status.to_string(),
            images: record.output_urls,
            error: record.error,
        }),
        None => Json(StatusResponse {
            success: true,
            status: JobStatus::Processing.to_string(),
            images: Vec::new(),
            error: None,
        }),
    }
}
