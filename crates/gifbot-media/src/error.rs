//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Maximum characters of tool output kept in an error.
pub const MAX_DIAGNOSTIC_CHARS: usize = 1500;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{tool} not found (checked tools directory and PATH)")]
    ToolNotFound { tool: String },

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Palette generation failed")]
    PaletteGenerationFailed { diagnostic: String },

    #[error("GIF render produced no output")]
    GifRenderFailed { diagnostic: String },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Could not resolve media: {message}")]
    ResolveFailed { message: String },

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Download exceeds {limit_bytes} bytes")]
    DownloadTooLarge { limit_bytes: u64 },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("{tool} timed out after {elapsed_ms} ms")]
    Timeout { tool: String, elapsed_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn resolve_failed(message: impl Into<String>) -> Self {
        Self::ResolveFailed {
            message: message.into(),
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Deadline expired; `limit` is reported to the millisecond.
    pub fn timeout(tool: impl Into<String>, limit: Duration) -> Self {
        Self::Timeout {
            tool: tool.into(),
            elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Tool output attached to this error, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            MediaError::PaletteGenerationFailed { diagnostic }
            | MediaError::GifRenderFailed { diagnostic } => Some(diagnostic),
            MediaError::FfmpegFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}

/// Keep the last `max_chars` characters of `text`, on a char boundary.
///
/// Tool logs put the useful error at the end, so the tail is kept.
pub fn tail_excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim_end();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let skip = count - max_chars;
    let tail: String = text.chars().skip(skip).collect();
    format!("…{}", tail)
}
