//! Per-request temporary files.
//!
//! All requests share one work directory. Each request gets a unique stem,
//! `{request_id}_{16 hex}`, and every file it creates is registered here so
//! [`ArtifactSet::cleanup`] can remove them on any exit path.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use gifbot_models::RequestId;

/// Artifact kinds created during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Source,
    Palette,
    Gif,
}

impl ArtifactKind {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Source => "source",
            ArtifactKind::Palette => "palette.png",
            ArtifactKind::Gif => "output.gif",
        }
    }
}

/// Registered temporary files for one request.
#[derive(Debug)]
pub struct ArtifactSet {
    work_dir: PathBuf,
    stem: String,
    registered: Vec<PathBuf>,
}

impl ArtifactSet {
    /// Create an empty set. No file is touched until [`path`](Self::path) is
    /// used and the caller writes to it.
    pub fn new(work_dir: impl Into<PathBuf>, request_id: &RequestId) -> Self {
        let stem = format!("{}_{:016x}", request_id, rand::random::<u64>());
        Self {
            work_dir: work_dir.into(),
            stem,
            registered: Vec::new(),
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Register and return the path for an artifact.
    pub fn path(&mut self, kind: ArtifactKind) -> PathBuf {
        let path = self
            .work_dir
            .join(format!("{}_{}", self.stem, kind.file_suffix()));
        if !self.registered.contains(&path) {
            self.registered.push(path.clone());
        }
        path
    }

    /// Source path keeping the original extension, so ffmpeg can sniff it.
    pub fn source_path(&mut self, extension: Option<&str>) -> PathBuf {
        let mut path = self.path(ArtifactKind::Source);
        if let Some(ext) = extension.filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric())) {
            self.registered.retain(|p| p != &path);
            path.set_extension(ext.to_ascii_lowercase());
            self.registered.push(path.clone());
        }
        path
    }

    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// Remove every registered file. Missing files are fine; other failures
    /// are logged and never returned.
    pub async fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.registered.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %path.display(), "Removed temporary file");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
                }
            }
        }
        removed
    }
}

impl Drop for ArtifactSet {
    // Only reached with files still registered when the owning task unwinds
    // before `cleanup` ran.
    fn drop(&mut self) {
        for path in self.registered.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove temporary file on drop");
                }
            }
        }
    }
}
