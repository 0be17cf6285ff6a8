use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use crate::models::job::{JobStatus, ResultRecord};
use crate::models::staging::StageRequest;
use crate::services::image_host::{ImageHostError, ImgbbClient};
use crate::services::image_pipeline::ImagePipeline;
use crate::services::instantdeco::{
    derive_block_elements, InstantDecoClient, InstantDecoError, StagingPayload,
};
use crate::services::poll::{poll_until_terminal, PollError, PollPolicy};
use crate::services::rate_limit::{RateDecision, RateLimiter};
use crate::services::reimagine::{
    furnishing_masks, GenerationParams, ReimagineClient, ReimagineError,
};
use crate::services::result_store::ResultStore;

/// A webhook-path submission accepted by the vendor.
#[derive(Debug, Clone)]
pub struct Submission {
    pub correlation_id: String,
    pub webhook_url: String,
}

/// Tunables the submitter needs from configuration.
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub webhook_url: String,
    pub num_images: u8,
    pub high_resolution: bool,
    pub mask_policy: PollPolicy,
    pub render_policy: PollPolicy,
}

/// Orchestrates outbound staging submissions. Every submission passes the
/// process-wide rate limiter before any vendor contact, and inputs that are
/// not URLs are published through the image host first.
pub struct JobSubmitter {
    settings: SubmitterSettings,
    limiter: Arc<RateLimiter>,
    results: Arc<ResultStore>,
    instantdeco: Arc<InstantDecoClient>,
    reimagine: Arc<ReimagineClient>,
    host: Arc<ImgbbClient>,
    pipeline: Arc<ImagePipeline>,
}

impl JobSubmitter {
    pub fn new(
        settings: SubmitterSettings,
        limiter: Arc<RateLimiter>,
        results: Arc<ResultStore>,
        instantdeco: Arc<InstantDecoClient>,
        reimagine: Arc<ReimagineClient>,
        host: Arc<ImgbbClient>,
        pipeline: Arc<ImagePipeline>,
    ) -> Self {
        Self {
            settings,
            limiter,
            results,
            instantdeco,
            reimagine,
            host,
            pipeline,
        }
    }

    /// Submit to the webhook-based vendor. Returns the vendor's request id;
    /// the rendered result arrives later at the webhook receiver.
    pub async fn submit(&self, req: &StageRequest) -> Result<Submission, SubmitError> {
        self.check_rate_limit()?;

        let img_url = self.resolve_image_url(&req.image).await?;
        let payload = self.build_payload(req, img_url);

        let correlation_id = self.instantdeco.submit(&payload).await?;
        self.limiter.record_accepted(Instant::now());
        counter!("staging_submissions_total", "vendor" => "instantdeco").increment(1);
        tracing::info!(%correlation_id, "staging job submitted");

        Ok(Submission {
            correlation_id,
            webhook_url: self.settings.webhook_url.clone(),
        })
    }

    /// Submit to the webhook-less vendor and drive it to a terminal state:
    /// mask creation, furnishing-mask selection, generation, then re-hosting
    /// of every output. The terminal record is stored before returning so
    /// the result stays readable by correlation id.
    pub async fn submit_polled(&self, req: &StageRequest) -> Result<ResultRecord, SubmitError> {
        self.check_rate_limit()?;

        let img_url = self.resolve_image_url(&req.image).await?;

        let mask_job = self.reimagine.create_mask(&img_url).await?;
        self.limiter.record_accepted(Instant::now());
        counter!("staging_submissions_total", "vendor" => "reimagine").increment(1);
        tracing::info!(mask_job = %mask_job, "mask creation started");

        let masks =
            poll_until_terminal(&self.settings.mask_policy, |_| {
                self.reimagine.get_mask_job(&mask_job)
            })
            .await?;

        let mask_urls = furnishing_masks(&masks);
        if mask_urls.is_empty() {
            return Err(ReimagineError::Rejected(
                "no furnishing masks detected in source image".to_string(),
            )
            .into());
        }

        let params = GenerationParams {
            image_url: img_url,
            mask_urls,
            mask_category: "furnishing".to_string(),
            space_type: req.space_type.clone(),
            design_theme: req.design_style.clone(),
            generation_count: self.settings.num_images,
        };
        let render_job = self.reimagine.generate(&params).await?;
        tracing::info!(render_job = %render_job, "generation started");

        let vendor_urls =
            poll_until_terminal(&self.settings.render_policy, |_| {
                self.reimagine.get_generation_job(&render_job)
            })
            .await?;

        let record = self.publish_outputs(render_job, vendor_urls).await;
        self.results.put(record.clone());

        Ok(record)
    }

    fn check_rate_limit(&self) -> Result<(), SubmitError> {
        match self.limiter.check(Instant::now()) {
            RateDecision::Allowed => Ok(()),
            RateDecision::Limited { wait_secs } => {
                counter!("staging_submissions_rate_limited_total").increment(1);
                Err(SubmitError::RateLimited { wait_secs })
            }
        }
    }

    /// Turn the inbound `image` field into a URL the vendor can fetch.
    /// Absolute URLs pass through; anything else is treated as base64 (data
    /// URL or raw) and published through the image host.
    async fn resolve_image_url(&self, image: &str) -> Result<String, SubmitError> {
        if image.starts_with("http://") || image.starts_with("https://") {
            return Ok(image.to_string());
        }

        let bytes = decode_image_payload(image)?;
        let name = format!("upload-{}", Uuid::new_v4());
        Ok(self.host.upload(&bytes, &name).await?)
    }

    fn build_payload(&self, req: &StageRequest, img_url: String) -> StagingPayload {
        let blocked = derive_block_elements(
            req.transformation_type,
            req.update_flooring,
            req.block_decorative,
        );

        StagingPayload {
            design: req.design_style.clone(),
            room_type: req.room_type.clone(),
            transformation_type: req.transformation_type,
            img_url,
            webhook_url: self.settings.webhook_url.clone(),
            num_images: self.settings.num_images,
            block_element: blocked.join(","),
            high_details_resolution: self.settings.high_resolution.then_some(true),
        }
    }

    /// Re-host every vendor output, falling back to the vendor URL for any
    /// image the pipeline cannot publish. The result is degraded in that
    /// case, never lost.
    async fn publish_outputs(&self, correlation_id: String, vendor_urls: Vec<String>) -> ResultRecord {
        let mut output_urls = Vec::with_capacity(vendor_urls.len());
        let mut rehost_errors = Vec::new();

        for url in &vendor_urls {
            match self.pipeline.rehost(url).await {
                Ok(rehosted) => output_urls.push(rehosted.url),
                Err(e) => {
                    counter!("staging_rehost_failures_total").increment(1);
                    tracing::warn!(error = %e, source_url = %url, "rehost failed, keeping vendor URL");
                    rehost_errors.push(e.to_string());
                    output_urls.push(url.clone());
                }
            }
        }

        ResultRecord {
            correlation_id,
            status: JobStatus::Completed,
            output_urls,
            original_vendor_url: vendor_urls.first().cloned(),
            error: (!rehost_errors.is_empty()).then(|| rehost_errors.join("; ")),
            stored_at: Utc::now(),
        }
    }
}

/// Decode a data-URL or raw-base64 image payload into bytes.
fn decode_image_payload(image: &str) -> Result<Vec<u8>, SubmitError> {
    let encoded = image
        .rsplit_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(image);

    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| SubmitError::InvalidImage(format!("base64 decode failed: {e}")))
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("rate limited, retry in {wait_secs}s")]
    RateLimited { wait_secs: u64 },

    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    ImageHost(#[from] ImageHostError),

    #[error(transparent)]
    Vendor(#[from] InstantDecoError),

    #[error(transparent)]
    Reimagine(#[from] ReimagineError),

    #[error(transparent)]
    Poll(#[from] PollError),
}
