//! Attachment download over HTTP.
//!
//! The body is streamed to disk chunk by chunk and aborted once it exceeds
//! the configured cap, so an oversized upload never fills the work dir.

use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Default cap for downloaded attachments (100 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Streaming HTTP downloader.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl Downloader {
    /// Create a downloader with its own client.
    pub fn new(max_bytes: u64, timeout: Duration) -> MediaResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, max_bytes))
    }

    pub fn with_client(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Download `url` to `output_path`. Returns the number of bytes written.
    ///
    /// A partial file may be left behind on failure; the caller owns its
    /// cleanup.
    pub async fn download(&self, url: &str, output_path: impl AsRef<Path>) -> MediaResult<u64> {
        let output_path = output_path.as_ref();
        info!(output = %output_path.display(), "Downloading attachment");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "server returned {}",
                status
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                warn!(length, limit = self.max_bytes, "Attachment too large, not downloading");
                return Err(MediaError::DownloadTooLarge {
                    limit_bytes: self.max_bytes,
                });
            }
        }

        let mut file = File::create(output_path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MediaError::download_failed(format!("body read failed: {}", e)))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                warn!(written, limit = self.max_bytes, "Attachment exceeded cap mid-stream");
                return Err(MediaError::DownloadTooLarge {
                    limit_bytes: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        debug!(bytes = written, "Download finished");

        if written == 0 {
            return Err(MediaError::download_failed("empty response body"));
        }

        info!(
            output = %output_path.display(),
            size_mb = written as f64 / (1024.0 * 1024.0),
            "Downloaded attachment successfully"
        );
        Ok(written)
    }
}
