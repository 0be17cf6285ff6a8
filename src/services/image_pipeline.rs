use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use metrics::counter;
use reqwest::Client;
use uuid::Uuid;

use crate::services::image_host::{ImageHostError, ImgbbClient};

pub const JPEG_QUALITY: u8 = 85;
pub const MAX_WIDTH: u32 = 2048;

/// What happened to the bytes during the recompression stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    Recompressed {
        original_bytes: usize,
        encoded_bytes: usize,
    },
    OriginalKept {
        reason: String,
    },
}

/// A successfully re-hosted image.
#[derive(Debug, Clone)]
pub struct RehostedImage {
    pub url: String,
    pub compression: Compression,
}

/// Moves a staged image from the vendor's temporary URL onto storage we
/// control: download, recompress, upload.
pub struct ImagePipeline {
    http: Client,
    host: Arc<ImgbbClient>,
}

impl ImagePipeline {
    pub fn new(host: Arc<ImgbbClient>) -> Result<Self, RehostError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| RehostError::Download(e.to_string()))?;

        Ok(Self { http, host })
    }

    /// Fetch `source_url`, recompress, and publish to the permanent host.
    ///
    /// Download and upload failures abort the pipeline; a recompression
    /// failure does not (the original bytes are published instead, with the
    /// outcome recorded in [`RehostedImage::compression`]).
    pub async fn rehost(&self, source_url: &str) -> Result<RehostedImage, RehostError> {
        let bytes = self.download(source_url).await?;
        let (bytes, compression) = recompress(&bytes);

        let name = format!("staged-{}", Uuid::new_v4());
        let url = self.host.upload(&bytes, &name).await?;

        Ok(RehostedImage { url, compression })
    }

    async fn download(&self, source_url: &str) -> Result<Vec<u8>, RehostError> {
        let response = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| RehostError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RehostError::Download(format!(
                "HTTP {} fetching {source_url}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RehostError::Download(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// Re-encode image bytes as quality-85 JPEG, capped at [`MAX_WIDTH`] pixels
/// wide (aspect ratio preserved).
///
/// Never fails: undecodable or unencodable input falls back to the original
/// bytes, with the reason carried in the returned [`Compression`].
pub fn recompress(bytes: &[u8]) -> (Vec<u8>, Compression) {
    match try_recompress(bytes) {
        Ok(encoded) => {
            let compression = Compression::Recompressed {
                original_bytes: bytes.len(),
                encoded_bytes: encoded.len(),
            };
            (encoded, compression)
        }
        Err(e) => {
            counter!("staging_recompress_fallback_total").increment(1);
            tracing::warn!(error = %e, "recompression failed, keeping original bytes");
            (
                bytes.to_vec(),
                Compression::OriginalKept {
                    reason: e.to_string(),
                },
            )
        }
    }
}

fn try_recompress(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let mut img = image::load_from_memory(bytes)?;

    let (width, height) = (img.width(), img.height());
    if width > MAX_WIDTH {
        let scaled_height = ((height as u64 * MAX_WIDTH as u64) / width as u64).max(1) as u32;
        img = img.resize_exact(MAX_WIDTH, scaled_height, FilterType::Lanczos3);
    }

    // JPEG has no alpha channel, so flatten before encoding.
    let rgb = img.to_rgb8();
    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY);
    encoder.encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(encoded)
}

#[derive(Debug, thiserror::Error)]
pub enum RehostError {
    #[error("image download failed: {0}")]
    Download(String),

    #[error(transparent)]
    Upload(#[from] ImageHostError),
}
