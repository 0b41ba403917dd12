//! Remote media resolution using yt-dlp.
//!
//! Page URLs (streaming sites, social posts) are turned into a direct media
//! URL that ffmpeg can read. Nothing is downloaded: ffmpeg seeks into the
//! stream and decodes only the requested segment.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{tail_excerpt, MediaError, MediaResult};

/// Single progressive stream, so the result has one direct URL and no merge.
pub const DEFAULT_FORMAT: &str = "best[ext=mp4]/best";

/// Resolved remote media.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMedia {
    /// Direct media URL for ffmpeg
    pub stream_url: String,
    /// Total duration in seconds, when the extractor knows it
    pub duration: Option<f64>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    url: Option<String>,
    duration: Option<f64>,
    title: Option<String>,
    #[serde(default)]
    requested_formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    url: Option<String>,
}

/// yt-dlp wrapper.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    program: PathBuf,
    format: String,
    timeout: Duration,
}

impl MediaResolver {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            format: DEFAULT_FORMAT.to_string(),
            timeout,
        }
    }

    /// Override the yt-dlp format selector.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn build_args(&self, url: &str) -> Vec<String> {
        vec![
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            self.format.clone(),
            url.to_string(),
        ]
    }

    /// Resolve a page URL to a direct stream.
    pub async fn resolve(&self, url: &str) -> MediaResult<ResolvedMedia> {
        info!(url = %url, "Resolving remote media");

        let child = Command::new(&self.program)
            .args(self.build_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaError::timeout("yt-dlp", self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            let error_msg = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("Unknown error");
            return Err(MediaError::resolve_failed(format!(
                "yt-dlp failed: {}",
                tail_excerpt(error_msg, 300)
            )));
        }

        let resolved = parse_resolve_output(&output.stdout)?;
        info!(
            duration = ?resolved.duration,
            title = resolved.title.as_deref().unwrap_or(""),
            "Resolved remote media"
        );
        Ok(resolved)
    }
}

/// Parse the `-J` info document.
pub fn parse_resolve_output(stdout: &[u8]) -> MediaResult<ResolvedMedia> {
    let info: YtDlpInfo = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::resolve_failed(format!("unreadable yt-dlp output: {}", e)))?;

    let stream_url = info
        .url
        .or_else(|| info.requested_formats.into_iter().find_map(|f| f.url))
        .filter(|u| !u.is_empty())
        .ok_or_else(|| MediaError::resolve_failed("no direct media URL in yt-dlp output"))?;

    Ok(ResolvedMedia {
        stream_url,
        duration: info.duration.filter(|d| d.is_finite() && *d > 0.0),
        title: info.title,
    })
}
