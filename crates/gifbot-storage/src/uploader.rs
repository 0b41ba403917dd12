//! Hosting uploader seam.

use async_trait::async_trait;
use std::path::Path;

use gifbot_models::HostExpiry;

use crate::error::StorageResult;

/// A temporary file host.
#[async_trait]
pub trait HostUploader: Send + Sync {
    /// Largest file this host accepts.
    fn max_upload_bytes(&self) -> u64;

    /// Upload `path`, kept for `expiry`. Returns the public URL.
    async fn upload(&self, path: &Path, expiry: HostExpiry) -> StorageResult<String>;
}
