//! InstantDeco staging client.
//!
//! The primary staging vendor. Submission is fire-and-forget: the vendor
//! returns a request id immediately and delivers the rendered image later by
//! POSTing to our webhook receiver.

use reqwest::Client;
use serde::Serialize;

use crate::models::staging::TransformationType;

/// Submission payload for the staging endpoint.
///
/// Field order is vendor-mandated and must survive serialization exactly as
/// declared here. `high_details_resolution` is an optional trailing key and
/// is omitted entirely when unset.
#[derive(Debug, Clone, Serialize)]
pub struct StagingPayload {
    pub design: String,
    pub room_type: String,
    pub transformation_type: TransformationType,
    pub img_url: String,
    pub webhook_url: String,
    pub num_images: u8,
    pub block_element: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_details_resolution: Option<bool>,
}

/// Derive the comma-joined `block_element` list from the request's semantic
/// flags.
///
/// Transformations that restage room contents must not repaint the
/// architectural shell, so furnish, redesign, and empty block it outright.
/// Flooring is blocked unless the caller asked to update it, and the
/// decorative set is blocked on request.
pub fn derive_block_elements(
    transformation: TransformationType,
    update_flooring: bool,
    block_decorative: bool,
) -> Vec<&'static str> {
    let mut blocked = Vec::new();

    if matches!(
        transformation,
        TransformationType::Furnish | TransformationType::Redesign | TransformationType::Empty
    ) {
        blocked.extend(["wall", "ceiling", "door", "windowpane"]);
    }

    if !update_flooring {
        blocked.push("floor");
    }

    if block_decorative {
        blocked.extend(["curtain", "carpet", "wall_decoration"]);
    }

    blocked
}

pub struct InstantDecoClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl InstantDecoClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, InstantDecoError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| InstantDecoError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Submit a staging job, returning the vendor's request id.
    pub async fn submit(&self, payload: &StagingPayload) -> Result<String, InstantDecoError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| InstantDecoError::Unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| InstantDecoError::Unavailable(e.to_string()))?;

        classify_submit_response(status, &body)
    }
}

/// Classify a raw submission response into a request id or an error.
///
/// The vendor's failure modes are observably inconsistent: auth problems
/// arrive as HTML pages, "Request Ent…" plaintext, or JSON with
/// `message == "Wrong API Key"`, while quota and validation failures arrive
/// as structured error JSON.
fn classify_submit_response(status: u16, body: &str) -> Result<String, InstantDecoError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') || trimmed.starts_with("Request Ent") {
        return Err(InstantDecoError::Auth);
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| {
        InstantDecoError::Unavailable(format!(
            "non-JSON vendor response (HTTP {status}): {}",
            trimmed.chars().take(80).collect::<String>()
        ))
    })?;

    if value.get("message").and_then(|m| m.as_str()) == Some("Wrong API Key") {
        return Err(InstantDecoError::Auth);
    }

    let vendor_status = value.get("status").and_then(|s| s.as_str());
    if !(200..300).contains(&status) || vendor_status == Some("error") {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.get("error").and_then(|e| e.as_str()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(InstantDecoError::Rejected(message));
    }

    value
        .get("response")
        .and_then(|r| r.get("request_id"))
        .or_else(|| value.get("request_id"))
        .and_then(json_id)
        .ok_or_else(|| InstantDecoError::Unavailable("vendor response missing request id".to_string()))
}

fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InstantDecoError {
    #[error("vendor rejected the API key")]
    Auth,

    #[error("vendor rejected the submission: {0}")]
    Rejected(String),

    #[error("vendor unavailable: {0}")]
    Unavailable(String),
}
