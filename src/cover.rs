//! Cover art fetching and transcoding
//!
//! Resolves a cover-image URL to a size-bounded JPEG buffer. Every failure
//! mode (bad URL, network error, undecodable bytes) degrades to "no cover";
//! a missing cover never fails an album job. A single attempt is made, no
//! retries.

use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

use crate::config::CoverConfig;

/// Fetches a cover image over HTTP and re-encodes it as a bounded JPEG
pub struct CoverArtFetcher {
    client: reqwest::Client,
    max_dimension: u32,
    jpeg_quality: u8,
}

impl CoverArtFetcher {
    /// Create a fetcher from the cover configuration
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_dimension: config.cover_max_dimension,
            jpeg_quality: config.cover_jpeg_quality,
        }
    }

    /// Fetch `url` and return a JPEG buffer no larger than the configured
    /// bound on either dimension, or `None` if anything goes wrong.
    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        if url.trim().is_empty() {
            return None;
        }

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url, error = %e, "Cover art request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url, status = %response.status(), "Cover art request rejected");
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                tracing::warn!(url, error = %e, "Failed to read cover art body");
                return None;
            }
        };

        let max_dimension = self.max_dimension;
        let jpeg_quality = self.jpeg_quality;

        // Decode + resize + re-encode is CPU work; keep it off the async threads
        let transcoded =
            tokio::task::spawn_blocking(move || transcode(&bytes, max_dimension, jpeg_quality))
                .await;

        match transcoded {
            Ok(Ok(jpeg)) => {
                tracing::debug!(url, bytes = jpeg.len(), "Cover art transcoded");
                Some(jpeg)
            }
            Ok(Err(e)) => {
                tracing::warn!(url, error = %e, "Cover art could not be decoded");
                None
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Cover art transcode task failed");
                None
            }
        }
    }
}

/// Decode an image buffer, bound its dimensions, and re-encode as JPEG.
fn transcode(bytes: &[u8], max_dimension: u32, quality: u8) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width().max(img.height()) > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(&rgb)?;
    Ok(out.into_inner())
}
