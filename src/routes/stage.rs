use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::staging::{PolledStageResponse, StageRequest, StageResponse};
use crate::routes::error::ApiError;

/// POST /stage — submit a photo to the webhook-based staging vendor.
///
/// Returns the vendor's request id; the staged image arrives later at the
/// webhook receiver and becomes readable via `GET /webhook-receiver`.
pub async fn submit_stage(
    State(state): State<AppState>,
    Json(req): Json<StageRequest>,
) -> Result<Json<StageResponse>, ApiError> {
    req.validate()
        .map_err(|report| ApiError::Validation(report.to_string()))?;

    let submission = state.submitter.submit(&req).await?;

    Ok(Json(StageResponse {
        success: true,
        request_id: submission.correlation_id,
        webhook_url: submission.webhook_url,
    }))
}

/// POST /stage/reimagine — submit to the webhook-less vendor and wait.
///
/// Drives mask creation and generation to a terminal state before
/// responding, so the reply already carries the staged image URLs. The
/// result is also stored and stays readable by request id.
pub async fn submit_stage_polled(
    State(state): State<AppState>,
    Json(req): Json<StageRequest>,
) -> Result<Json<PolledStageResponse>, ApiError> {
    req.validate()
        .map_err(|report| ApiError::Validation(report.to_string()))?;

    let record = state.submitter.submit_polled(&req).await?;

    Ok(Json(PolledStageResponse {
        success: true,
        request_id: record.correlation_id,
        status: record.status.to_string(),
        images: record.output_urls,
    }))
}
