//! Downloads original photos, re-renders them into the marketplace's
//! preferred square thumbnail shape, and re-uploads them under a
//! listing-scoped storage path. Every failure here is survivable: bad
//! images are skipped and an empty batch makes the caller fall back to the
//! original URLs.

use crate::http::build_client;
use crate::supabase::SupabaseClient;
use chrono::Utc;
use futures::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use reqwest::Client;
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, warn};

/// eBay renders square thumbnails; 1600px keeps zoom enabled.
const TARGET_EDGE: u32 = 1600;
const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum ImagePrepareError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

#[derive(Clone)]
pub struct ImagePreparer {
    http: Client,
    storage: SupabaseClient,
    bucket: String,
}

impl ImagePreparer {
    pub fn new(storage: SupabaseClient, bucket: String) -> Self {
        Self {
            http: build_client(),
            storage,
            bucket,
        }
    }

    /// Prepares a batch concurrently, one task per image. Failed entries
    /// are dropped; the relative order of successes is preserved.
    pub async fn prepare(&self, original_urls: &[String], submission_id: &str) -> Vec<String> {
        let stamp = Utc::now().timestamp_millis();
        let tasks = original_urls.iter().enumerate().map(|(index, url)| {
            let url = url.clone();
            async move {
                match self.prepare_one(&url, submission_id, stamp, index).await {
                    Ok(public_url) => Some(public_url),
                    Err(err) => {
                        warn!(
                            target = "bluberry.images",
                            submission_id = submission_id,
                            url = %url,
                            error = %err,
                            "skipping image"
                        );
                        None
                    }
                }
            }
        });
        join_all(tasks).await.into_iter().flatten().collect()
    }

    async fn prepare_one(
        &self,
        url: &str,
        submission_id: &str,
        stamp: i64,
        index: usize,
    ) -> Result<String, ImagePrepareError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ImagePrepareError::Fetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ImagePrepareError::Fetch(format!(
                "HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ImagePrepareError::Fetch(err.to_string()))?;

        let optimized = optimize_to_square(&bytes)?;
        debug!(
            target = "bluberry.images",
            submission_id = submission_id,
            index = index,
            original_bytes = bytes.len(),
            optimized_bytes = optimized.len(),
            "image optimized"
        );

        let path = format!("ebay-optimized/{submission_id}/{stamp}-{index}.jpg");
        self.storage
            .upload_object(&self.bucket, &path, optimized, "image/jpeg")
            .await
            .map_err(|err| ImagePrepareError::Upload(err.to_string()))
    }
}

/// Crop-to-cover into a fixed square, re-encoded as baseline JPEG. The
/// crop (rather than letterboxing) is what the marketplace's thumbnailer
/// expects.
pub fn optimize_to_square(bytes: &[u8]) -> Result<Vec<u8>, ImagePrepareError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|err| ImagePrepareError::Decode(err.to_string()))?;
    let resized = decoded.resize_to_fill(TARGET_EDGE, TARGET_EDGE, FilterType::Lanczos3);
    // JPEG has no alpha channel; flatten before encoding.
    let rgb = resized.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|err| ImagePrepareError::Encode(err.to_string()))?;
    Ok(out.into_inner())
}
