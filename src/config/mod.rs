use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Publicly reachable base URL of this service, used to build the
    /// webhook callback URL handed to the staging vendor.
    pub public_base_url: String,

    /// InstantDeco API key
    pub instantdeco_api_key: String,

    /// InstantDeco workflow endpoint
    #[serde(default = "default_instantdeco_api_url")]
    pub instantdeco_api_url: String,

    /// ReimagineHome API key (webhook-less vendor, status polling)
    pub reimagine_api_key: String,

    /// ReimagineHome API base URL
    #[serde(default = "default_reimagine_api_url")]
    pub reimagine_api_url: String,

    /// ImgBB API key for permanent image hosting
    pub imgbb_api_key: String,

    /// ImgBB upload endpoint
    #[serde(default = "default_imgbb_api_url")]
    pub imgbb_api_url: String,

    /// Minimum gap between accepted vendor submissions, in seconds
    #[serde(default = "default_min_interval_secs")]
    pub min_request_interval_secs: u64,

    /// Rolling quota window length, in seconds
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,

    /// Maximum accepted submissions per quota window
    #[serde(default = "default_rate_window_max")]
    pub rate_window_max: u32,

    /// How long finished results stay readable, in seconds
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,

    /// Number of staged variants requested from InstantDeco
    #[serde(default = "default_num_images")]
    pub num_images: u8,

    /// Request high-resolution output from InstantDeco
    #[serde(default = "default_high_resolution")]
    pub high_resolution: bool,

    /// Mask-creation polling: attempts and interval
    #[serde(default = "default_mask_poll_attempts")]
    pub mask_poll_attempts: u32,
    #[serde(default = "default_mask_poll_interval_secs")]
    pub mask_poll_interval_secs: u64,

    /// Generation polling: attempts and interval
    #[serde(default = "default_render_poll_attempts")]
    pub render_poll_attempts: u32,
    #[serde(default = "default_render_poll_interval_secs")]
    pub render_poll_interval_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_instantdeco_api_url() -> String {
    "https://app.instantdeco.ai/api/1.1/wf/instant_deco".to_string()
}

fn default_reimagine_api_url() -> String {
    "https://api.reimaginehome.ai/v1".to_string()
}

fn default_imgbb_api_url() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

fn default_min_interval_secs() -> u64 {
    45
}

fn default_rate_window_secs() -> u64 {
    3600
}

fn default_rate_window_max() -> u32 {
    80
}

fn default_result_ttl_secs() -> u64 {
    3600
}

fn default_num_images() -> u8 {
    1
}

fn default_high_resolution() -> bool {
    true
}

fn default_mask_poll_attempts() -> u32 {
    20
}

fn default_mask_poll_interval_secs() -> u64 {
    3
}

fn default_render_poll_attempts() -> u32 {
    40
}

fn default_render_poll_interval_secs() -> u64 {
    3
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Full callback URL registered with the staging vendor.
    pub fn webhook_url(&self) -> String {
        format!(
            "{}/webhook-receiver",
            self.public_base_url.trim_end_matches('/')
        )
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(self.min_request_interval_secs)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}
