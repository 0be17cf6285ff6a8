use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics::counter;

use crate::models::job::{JobStatus, ResultRecord};
use crate::models::staging::VendorCallback;
use crate::services::image_pipeline::ImagePipeline;
use crate::services::result_store::ResultStore;

/// Matches vendor callbacks to submissions by correlation id and writes the
/// terminal record. Callbacks for the same id are serialized through a
/// per-id async lock; different ids proceed concurrently.
pub struct WebhookCorrelator {
    results: Arc<ResultStore>,
    pipeline: Arc<ImagePipeline>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WebhookCorrelator {
    pub fn new(results: Arc<ResultStore>, pipeline: Arc<ImagePipeline>) -> Self {
        Self {
            results,
            pipeline,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process one vendor callback to completion.
    ///
    /// Never returns an error: the webhook response to the vendor does not
    /// depend on what happens here, and a result is degraded to the vendor's
    /// own URL rather than dropped when re-hosting fails.
    pub async fn handle(&self, callback: VendorCallback) {
        counter!("staging_webhook_callbacks_total").increment(1);
        let id = callback.request_id.clone();

        {
            let gate = self.lock_for(&id);
            let _guard = gate.lock().await;

            let record = self.build_record(&id, &callback).await;
            self.results.put(record);
        }
        self.release_lock(&id);

        let swept = self.results.sweep_expired(Utc::now());
        if swept > 0 {
            tracing::debug!(swept, "expired results evicted after callback");
        }
    }

    async fn build_record(&self, id: &str, callback: &VendorCallback) -> ResultRecord {
        let status = JobStatus::from_vendor(callback.status.as_deref());

        let Some(output_url) = callback.output.as_deref() else {
            tracing::info!(correlation_id = %id, %status, "callback carried no output URL");
            return ResultRecord::without_output(id.to_string(), status);
        };

        match self.pipeline.rehost(output_url).await {
            Ok(rehosted) => {
                tracing::info!(
                    correlation_id = %id,
                    %status,
                    output_url = %rehosted.url,
                    "staged image re-hosted"
                );
                ResultRecord {
                    correlation_id: id.to_string(),
                    status,
                    output_urls: vec![rehosted.url],
                    original_vendor_url: Some(output_url.to_string()),
                    error: None,
                    stored_at: Utc::now(),
                }
            }
            Err(e) => {
                counter!("staging_rehost_failures_total").increment(1);
                tracing::warn!(
                    correlation_id = %id,
                    error = %e,
                    "rehost failed, publishing vendor URL"
                );
                ResultRecord {
                    correlation_id: id.to_string(),
                    status,
                    output_urls: vec![output_url.to_string()],
                    original_vendor_url: Some(output_url.to_string()),
                    error: Some(e.to_string()),
                    stored_at: Utc::now(),
                }
            }
        }
    }

    fn lock_for(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("correlation lock table poisoned");
        locks.entry(id.to_string()).or_default().clone()
    }

    /// Drop the per-id lock entry once no handler holds or waits on it.
    fn release_lock(&self, id: &str) {
        let mut locks = self.locks.lock().expect("correlation lock table poisoned");
        if let Some(gate) = locks.get(id) {
            if Arc::strong_count(gate) == 1 {
                locks.remove(id);
            }
        }
    }
}
