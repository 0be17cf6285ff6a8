//! HTTP mapping for service errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::instantdeco::InstantDecoError;
use crate::services::poll::PollError;
use crate::services::reimagine::ReimagineError;
use crate::services::submitter::SubmitError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": message }),
            ),
            ApiError::Submit(SubmitError::RateLimited { wait_secs }) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": format!("rate limited, retry in {wait_secs}s"),
                    "retryAfter": wait_secs,
                }),
            ),
            ApiError::Submit(SubmitError::InvalidImage(message)) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Submit(SubmitError::ImageHost(e)) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
            }
            ApiError::Submit(SubmitError::Vendor(InstantDecoError::Auth))
            | ApiError::Submit(SubmitError::Reimagine(ReimagineError::Auth)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "upstream authentication failed" }),
            ),
            ApiError::Submit(SubmitError::Vendor(InstantDecoError::Rejected(message)))
            | ApiError::Submit(SubmitError::Reimagine(ReimagineError::Rejected(message))) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": message }))
            }
            ApiError::Submit(SubmitError::Vendor(InstantDecoError::Unavailable(message)))
            | ApiError::Submit(SubmitError::Reimagine(ReimagineError::Unavailable(message))) => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": message }))
            }
            ApiError::Submit(SubmitError::Poll(PollError::TimedOut { attempts })) => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({ "error": format!("staging job still running after {attempts} status checks") }),
            ),
            ApiError::Submit(SubmitError::Poll(PollError::JobFailed(message))) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": message }))
            }
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %body["error"], "request failed");
        }

        (status, Json(body)).into_response()
    }
}
