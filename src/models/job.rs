use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a staging job as seen by clients polling for results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Map a vendor-reported status string onto our job status.
    ///
    /// Callbacks and poll responses are terminal by definition, so anything
    /// that is not an explicit failure marker counts as completed.
    pub fn from_vendor(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("failed") | Some("failure") | Some("error") | Some("cancelled")
            | Some("canceled") => JobStatus::Failed,
            _ => JobStatus::Completed,
        }
    }
}

/// Terminal outcome of a staging job, keyed by the vendor correlation id.
///
/// Created exactly once by the webhook correlator or the polling flow;
/// read-only afterward; evicted by the TTL sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub correlation_id: String,
    pub status: JobStatus,
    pub output_urls: Vec<String>,
    pub original_vendor_url: Option<String>,
    pub error: Option<String>,
    pub stored_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Record for a callback that carried no output image.
    pub fn without_output(correlation_id: String, status: JobStatus) -> Self {
        Self {
            correlation_id,
            status,
            output_urls: Vec::new(),
            original_vendor_url: None,
            error: None,
            stored_at: Utc::now(),
        }
    }
}
