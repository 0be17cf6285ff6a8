//! ImgBB upload client.
//!
//! The permanent image host for everything we publish: re-hosted staging
//! results and data-URL inputs that need a vendor-fetchable URL.
//! Upload API: <https://api.imgbb.com/1/upload>

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

/// Client for the ImgBB hosting API.
pub struct ImgbbClient {
    http: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    #[serde(default)]
    data: Option<UploadData>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    display_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    #[serde(default)]
    message: Option<String>,
}

impl ImgbbClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, ImageHostError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Upload image bytes, returning the public display URL.
    ///
    /// ImgBB takes the payload as a base64 form field; `name` becomes the
    /// hosted filename.
    pub async fn upload(&self, bytes: &[u8], name: &str) -> Result<String, ImageHostError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let form = reqwest::multipart::Form::new()
            .text("image", encoded)
            .text("name", name.to_string());

        let response = self
            .http
            .post(format!("{}?key={}", self.api_url, self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_upload_response(status, &body)
    }
}

/// Parse an ImgBB upload response body into the hosted URL.
fn parse_upload_response(status: u16, body: &str) -> Result<String, ImageHostError> {
    let envelope: UploadEnvelope = serde_json::from_str(body).map_err(|_| {
        ImageHostError::MalformedResponse(format!(
            "HTTP {status}: {}",
            body.chars().take(120).collect::<String>()
        ))
    })?;

    if envelope.success != Some(true) {
        let message = envelope
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "upload not accepted".to_string());
        return Err(ImageHostError::Rejected { status, message });
    }

    envelope
        .data
        .and_then(|d| d.display_url.or(d.url))
        .ok_or_else(|| {
            ImageHostError::MalformedResponse("success response without image URL".to_string())
        })
}

#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    #[error("image host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected upload (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("image host returned malformed response: {0}")]
    MalformedResponse(String),
}
