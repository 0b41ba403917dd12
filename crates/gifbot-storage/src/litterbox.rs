//! Litterbox temporary hosting client.
//!
//! Protocol: one multipart POST with `reqtype=fileupload`, `time=<tag>` and
//! the file under `fileToUpload`. A successful upload answers 2xx with the
//! public URL as the plain-text body; anything else is a failure.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use gifbot_models::HostExpiry;

use crate::error::{StorageError, StorageResult};
use crate::uploader::HostUploader;

pub const DEFAULT_ENDPOINT: &str = "https://litterbox.catbox.moe/resources/internals/api.php";

/// Litterbox's own per-file limit (1 GiB).
pub const LITTERBOX_MAX_BYTES: u64 = 1024 * 1024 * 1024;

/// Configuration for the Litterbox client.
#[derive(Debug, Clone)]
pub struct LitterboxConfig {
    /// Upload API endpoint
    pub endpoint: String,
    /// Per-file ceiling enforced before uploading
    pub max_upload_bytes: u64,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for LitterboxConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_upload_bytes: LITTERBOX_MAX_BYTES,
            timeout: Duration::from_secs(300),
        }
    }
}

impl LitterboxConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let defaults = Self::default();
        let endpoint = std::env::var("LITTERBOX_ENDPOINT").unwrap_or(defaults.endpoint);
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(StorageError::config_error(format!(
                "LITTERBOX_ENDPOINT must be an http(s) URL, got {}",
                endpoint
            )));
        }
        Ok(Self {
            endpoint,
            ..defaults
        })
    }
}

/// Litterbox client.
#[derive(Debug, Clone)]
pub struct LitterboxClient {
    client: reqwest::Client,
    config: LitterboxConfig,
}

impl LitterboxClient {
    /// Create a new client from configuration.
    pub fn new(config: LitterboxConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(LitterboxConfig::from_env()?)
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl HostUploader for LitterboxClient {
    fn max_upload_bytes(&self) -> u64 {
        self.config.max_upload_bytes
    }

    async fn upload(&self, path: &Path, expiry: HostExpiry) -> StorageResult<String> {
        let size_bytes = tokio::fs::metadata(path).await?.len();
        if size_bytes > self.config.max_upload_bytes {
            return Err(StorageError::TooLarge {
                size_bytes,
                limit_bytes: self.config.max_upload_bytes,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip.gif".to_string());
        debug!("Uploading {} ({} bytes) to Litterbox", file_name, size_bytes);

        let data = tokio::fs::read(path).await?;
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str("image/gif")
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        let form = Form::new()
            .text("reqtype", "fileupload")
            .text("time", expiry.as_tag())
            .part("fileToUpload", part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        let body = body.trim();

        if !status.is_success() {
            warn!(status = %status, "Litterbox upload failed");
            return Err(StorageError::rejected(format!("HTTP {}: {}", status, excerpt(body))));
        }

        if !(body.starts_with("https://") || body.starts_with("http://")) {
            warn!(status = %status, "Litterbox answered without a URL");
            return Err(StorageError::rejected(excerpt(body)));
        }

        info!(url = %body, expiry = expiry.as_tag(), "Uploaded GIF to Litterbox");
        Ok(body.to_string())
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}
