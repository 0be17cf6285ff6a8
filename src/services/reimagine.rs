//! ReimagineHome staging client.
//!
//! The webhook-less vendor: every operation returns a job id that must be
//! polled to a terminal state. A full staging run is two jobs composed
//! sequentially, mask creation and then image generation seeded with the
//! furnishing masks from the first stage.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::services::poll::PollOutcome;

/// One segmentation mask from the mask-creation job.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskInfo {
    pub url: String,
    pub category: String,
    pub area_percent: f64,
}

/// Select the mask URLs the generation stage needs: only the furnishing
/// category, everything else (architectural, flooring) stays untouched.
pub fn furnishing_masks(masks: &[MaskInfo]) -> Vec<String> {
    masks
        .iter()
        .filter(|m| m.category == "furnishing")
        .map(|m| m.url.clone())
        .collect()
}

/// Parameters for the generation job.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationParams {
    pub image_url: String,
    pub mask_urls: Vec<String>,
    pub mask_category: String,
    pub space_type: String,
    pub design_theme: String,
    pub generation_count: u8,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct MaskJob {
    #[serde(default)]
    job_status: Option<String>,
    #[serde(default)]
    masks: Vec<MaskEntry>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MaskEntry {
    url: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    area_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GenerationJob {
    #[serde(default)]
    job_status: Option<String>,
    #[serde(default)]
    generated_images: Vec<GeneratedImage>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

#[derive(Serialize)]
struct CreateMaskRequest<'a> {
    image_url: &'a str,
}

enum JobState {
    Done,
    Pending,
    Failed(String),
}

/// Map a vendor `job_status` string to our terminal-state model. Unknown and
/// absent statuses count as still running.
fn classify_job_status(job_status: Option<&str>, error_message: Option<&str>) -> JobState {
    match job_status {
        Some("done") => JobState::Done,
        Some("error") | Some("failed") => JobState::Failed(
            error_message
                .unwrap_or("vendor reported job failure without detail")
                .to_string(),
        ),
        _ => JobState::Pending,
    }
}

impl MaskJob {
    fn into_outcome(self) -> PollOutcome<Vec<MaskInfo>> {
        match classify_job_status(self.job_status.as_deref(), self.error_message.as_deref()) {
            JobState::Done => PollOutcome::Complete(
                self.masks
                    .into_iter()
                    .map(|m| MaskInfo {
                        url: m.url,
                        category: m.category.unwrap_or_default(),
                        area_percent: m.area_percent.unwrap_or(0.0),
                    })
                    .collect(),
            ),
            JobState::Failed(message) => PollOutcome::Failed(message),
            JobState::Pending => PollOutcome::Pending,
        }
    }
}

impl GenerationJob {
    fn into_outcome(self) -> PollOutcome<Vec<String>> {
        match classify_job_status(self.job_status.as_deref(), self.error_message.as_deref()) {
            JobState::Done => {
                PollOutcome::Complete(self.generated_images.into_iter().map(|g| g.url).collect())
            }
            JobState::Failed(message) => PollOutcome::Failed(message),
            JobState::Pending => PollOutcome::Pending,
        }
    }
}

pub struct ReimagineClient {
    http: Client,
    api_url: String,
    api_key: String,
}

impl ReimagineClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, ReimagineError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ReimagineError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Start a mask-creation job for `image_url`, returning its job id.
    pub async fn create_mask(&self, image_url: &str) -> Result<String, ReimagineError> {
        let created: JobCreated = self
            .post_json("create_mask", &CreateMaskRequest { image_url })
            .await?;
        Ok(created.job_id)
    }

    /// One status observation of a mask-creation job.
    pub async fn get_mask_job(
        &self,
        job_id: &str,
    ) -> Result<PollOutcome<Vec<MaskInfo>>, ReimagineError> {
        let job: MaskJob = self.get_json(&format!("create_mask/{job_id}")).await?;
        Ok(job.into_outcome())
    }

    /// Start a generation job, returning its job id.
    pub async fn generate(&self, params: &GenerationParams) -> Result<String, ReimagineError> {
        let created: JobCreated = self.post_json("generate_image", params).await?;
        Ok(created.job_id)
    }

    /// One status observation of a generation job.
    pub async fn get_generation_job(
        &self,
        job_id: &str,
    ) -> Result<PollOutcome<Vec<String>>, ReimagineError> {
        let job: GenerationJob = self.get_json(&format!("generate_image/{job_id}")).await?;
        Ok(job.into_outcome())
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ReimagineError> {
        let response = self
            .http
            .post(format!("{}/{path}", self.api_url))
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ReimagineError::Unavailable(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ReimagineError> {
        let response = self
            .http
            .get(format!("{}/{path}", self.api_url))
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ReimagineError::Unavailable(e.to_string()))?;

        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReimagineError> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ReimagineError::Auth);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReimagineError::Unavailable(e.to_string()))?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|_| {
            ReimagineError::Unavailable(format!(
                "non-JSON vendor response (HTTP {})",
                status.as_u16()
            ))
        })?;

        if envelope.status.as_deref() == Some("error") || !status.is_success() {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ReimagineError::Rejected(message));
        }

        envelope
            .data
            .ok_or_else(|| ReimagineError::Unavailable("vendor response missing data".to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReimagineError {
    #[error("vendor rejected the API key")]
    Auth,

    #[error("vendor rejected the request: {0}")]
    Rejected(String),

    #[error("vendor unavailable: {0}")]
    Unavailable(String),
}
