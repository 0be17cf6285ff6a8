use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::correlator::WebhookCorrelator;
use crate::services::image_host::{ImageHostError, ImgbbClient};
use crate::services::image_pipeline::{ImagePipeline, RehostError};
use crate::services::instantdeco::{InstantDecoClient, InstantDecoError};
use crate::services::poll::PollPolicy;
use crate::services::rate_limit::RateLimiter;
use crate::services::reimagine::{ReimagineClient, ReimagineError};
use crate::services::result_store::ResultStore;
use crate::services::submitter::{JobSubmitter, SubmitterSettings};

/// Shared application state, cheap to clone into request handlers.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub results: Arc<ResultStore>,
    pub submitter: Arc<JobSubmitter>,
    pub correlator: Arc<WebhookCorrelator>,
}

impl AppState {
    /// Build every service from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, StateInitError> {
        let limiter = Arc::new(RateLimiter::new(
            config.min_request_interval(),
            config.rate_window(),
            config.rate_window_max,
        ));
        let results = Arc::new(ResultStore::new(config.result_ttl()));

        let host = Arc::new(ImgbbClient::new(
            &config.imgbb_api_url,
            &config.imgbb_api_key,
        )?);
        let pipeline = Arc::new(ImagePipeline::new(host.clone())?);
        let instantdeco = Arc::new(InstantDecoClient::new(
            &config.instantdeco_api_url,
            &config.instantdeco_api_key,
        )?);
        let reimagine = Arc::new(ReimagineClient::new(
            &config.reimagine_api_url,
            &config.reimagine_api_key,
        )?);

        let settings = SubmitterSettings {
            webhook_url: config.webhook_url(),
            num_images: config.num_images,
            high_resolution: config.high_resolution,
            mask_policy: PollPolicy::new(
                config.mask_poll_attempts,
                Duration::from_secs(config.mask_poll_interval_secs),
            ),
            render_policy: PollPolicy::new(
                config.render_poll_attempts,
                Duration::from_secs(config.render_poll_interval_secs),
            ),
        };

        let submitter = Arc::new(JobSubmitter::new(
            settings,
            limiter.clone(),
            results.clone(),
            instantdeco,
            reimagine,
            host,
            pipeline.clone(),
        ));
        let correlator = Arc::new(WebhookCorrelator::new(results.clone(), pipeline));

        Ok(Self {
            limiter,
            results,
            submitter,
            correlator,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error(transparent)]
    ImageHost(#[from] ImageHostError),

    #[error(transparent)]
    Pipeline(#[from] RehostError),

    #[error(transparent)]
    InstantDeco(#[from] InstantDecoError),

    #[error(transparent)]
    Reimagine(#[from] ReimagineError),
}
