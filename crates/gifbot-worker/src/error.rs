//! Conversion error types.
//!
//! Every failure a request can hit maps to exactly one variant, one
//! user-facing message and one stable class label for logs and metrics.

use thiserror::Error;
use tracing::warn;

use gifbot_media::{tail_excerpt, MediaError};
use gifbot_models::TimeParseError;
use gifbot_storage::StorageError;

pub type ConversionResult<T> = Result<T, ConversionError>;

/// Maximum characters of diagnostic text carried by [`ConversionError::Unexpected`].
pub const MAX_UNEXPECTED_CHARS: usize = 500;

const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid time format: {input}")]
    InvalidFormat { input: String },

    #[error("Time range out of bounds: {reason}")]
    OutOfRange { reason: String },

    #[error("Requested {requested_secs}s exceeds maximum of {max_secs}s")]
    DurationExceedsMax { requested_secs: u32, max_secs: u32 },

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Palette generation failed")]
    PaletteGenerationFailed { diagnostic: String },

    #[error("GIF render failed")]
    GifRenderFailed { diagnostic: String },

    #[error("GIF of {size_bytes} bytes exceeds inline limit of {limit_bytes} bytes")]
    TooLargeForInline { size_bytes: u64, limit_bytes: u64 },

    #[error("GIF of {size_bytes} bytes exceeds hosting limit of {limit_bytes} bytes")]
    TooLargeForHost { size_bytes: u64, limit_bytes: u64 },

    #[error("Host upload failed: {0}")]
    HostUploadFailed(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ConversionError {
    pub fn out_of_range(reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create an unexpected error; the text keeps only its tail.
    pub fn unexpected(msg: impl AsRef<str>) -> Self {
        Self::Unexpected(tail_excerpt(msg.as_ref(), MAX_UNEXPECTED_CHARS))
    }

    /// Stable label for logs and metrics.
    pub fn class(&self) -> &'static str {
        match self {
            ConversionError::InvalidFormat { .. } => "invalid_format",
            ConversionError::OutOfRange { .. } => "out_of_range",
            ConversionError::DurationExceedsMax { .. } => "duration_exceeds_max",
            ConversionError::SourceUnavailable(_) => "source_unavailable",
            ConversionError::PaletteGenerationFailed { .. } => "palette_generation_failed",
            ConversionError::GifRenderFailed { .. } => "gif_render_failed",
            ConversionError::TooLargeForInline { .. } => "too_large_for_inline",
            ConversionError::TooLargeForHost { .. } => "too_large_for_host",
            ConversionError::HostUploadFailed(_) => "host_upload_failed",
            ConversionError::Unexpected(_) => "unexpected",
        }
    }

    /// Whether the user's input was at fault (as opposed to the pipeline).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConversionError::InvalidFormat { .. }
                | ConversionError::OutOfRange { .. }
                | ConversionError::DurationExceedsMax { .. }
        )
    }

    /// The single message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ConversionError::InvalidFormat { input } => format!(
                "Invalid time `{}`. Use SS, MM:SS or HH:MM:SS (for example `45`, `1:30` or `0:01:30`).",
                input
            ),
            ConversionError::OutOfRange { reason } => format!("Invalid time range: {}.", reason),
            ConversionError::DurationExceedsMax {
                requested_secs,
                max_secs,
            } => format!(
                "GIFs can be at most {} seconds long, but {} seconds were requested.",
                max_secs, requested_secs
            ),
            ConversionError::SourceUnavailable(reason) => {
                format!("Could not get the video: {}", reason)
            }
            ConversionError::PaletteGenerationFailed { .. } => {
                "Could not analyze the video's colors. The file may be corrupt or in an unsupported format.".to_string()
            }
            ConversionError::GifRenderFailed { .. } => {
                "Could not render the GIF from this video.".to_string()
            }
            ConversionError::TooLargeForInline {
                size_bytes,
                limit_bytes,
            } => format!(
                "The GIF is {:.1} MB, over the {:.0} MB attachment limit. Try a shorter range or pick a hosted link destination.",
                *size_bytes as f64 / MIB,
                *limit_bytes as f64 / MIB
            ),
            ConversionError::TooLargeForHost {
                size_bytes,
                limit_bytes,
            } => format!(
                "The GIF is {:.1} MB, over the {:.0} MB hosting limit. Try a shorter range.",
                *size_bytes as f64 / MIB,
                *limit_bytes as f64 / MIB
            ),
            ConversionError::HostUploadFailed(_) => {
                "Uploading the GIF to temporary hosting failed. Please try again later.".to_string()
            }
            ConversionError::Unexpected(diagnostic) => {
                format!("Something went wrong while converting: {}", diagnostic)
            }
        }
    }
}

impl From<TimeParseError> for ConversionError {
    fn from(e: TimeParseError) -> Self {
        match e {
            TimeParseError::InvalidFormat(input) => Self::InvalidFormat { input },
        }
    }
}

impl From<MediaError> for ConversionError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::PaletteGenerationFailed { diagnostic } => {
                Self::PaletteGenerationFailed { diagnostic }
            }
            MediaError::GifRenderFailed { diagnostic } => Self::GifRenderFailed { diagnostic },
            MediaError::ResolveFailed { message } | MediaError::DownloadFailed { message } => {
                Self::SourceUnavailable(message)
            }
            MediaError::DownloadTooLarge { limit_bytes } => Self::SourceUnavailable(format!(
                "the file is larger than {:.0} MB",
                limit_bytes as f64 / MIB
            )),
            MediaError::FileNotFound(path) => {
                warn!(path = %path.display(), "Source file missing");
                Self::SourceUnavailable("the downloaded file is missing".to_string())
            }
            other => {
                let mut text = other.to_string();
                if let Some(diagnostic) = other.diagnostic() {
                    text.push_str(": ");
                    text.push_str(diagnostic);
                }
                Self::unexpected(text)
            }
        }
    }
}

impl From<StorageError> for ConversionError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::TooLarge {
                size_bytes,
                limit_bytes,
            } => Self::TooLargeForHost {
                size_bytes,
                limit_bytes,
            },
            other => Self::HostUploadFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_is_bounded() {
        let long = format!("{}the real cause", "x".repeat(2000));
        let err = ConversionError::unexpected(&long);
        match &err {
            ConversionError::Unexpected(text) => {
                assert!(text.chars().count() <= MAX_UNEXPECTED_CHARS + 1);
                assert!(text.ends_with("the real cause"));
            }
            other => panic!("unexpected variant {:?}", other),
        }
        assert!(err.user_message().chars().count() < 600);
    }

    #[test]
    fn test_timeout_maps_to_unexpected() {
        let err: ConversionError =
            MediaError::timeout("ffmpeg", std::time::Duration::from_secs(120)).into();
        assert_eq!(err.class(), "unexpected");
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_source_errors() {
        let err: ConversionError = MediaError::resolve_failed("yt-dlp failed: 404").into();
        assert_eq!(err.class(), "source_unavailable");
        let err: ConversionError = MediaError::DownloadTooLarge {
            limit_bytes: 100 * 1024 * 1024,
        }
        .into();
        assert!(err.user_message().contains("100 MB"));
    }

    #[test]
    fn test_missing_file_hides_local_path() {
        let path = std::path::PathBuf::from("/var/lib/gifbot/work/req_1_source.mp4");
        let err: ConversionError = MediaError::FileNotFound(path).into();
        assert_eq!(err.class(), "source_unavailable");
        let message = err.user_message();
        assert!(!message.contains("/var/lib/gifbot"), "{}", message);
        assert!(!message.contains("req_1_source.mp4"), "{}", message);
        assert!(message.contains("missing"));
    }

    #[test]
    fn test_storage_too_large_maps_to_host_limit() {
        let err: ConversionError = StorageError::TooLarge {
            size_bytes: 2,
            limit_bytes: 1,
        }
        .into();
        assert!(matches!(err, ConversionError::TooLargeForHost { .. }));
        let err: ConversionError = StorageError::rejected("nope").into();
        assert_eq!(err.class(), "host_upload_failed");
    }

    #[test]
    fn test_inline_message_mentions_sizes() {
        let err = ConversionError::TooLargeForInline {
            size_bytes: 11 * 1024 * 1024,
            limit_bytes: 10 * 1024 * 1024,
        };
        let message = err.user_message();
        assert!(message.contains("11.0 MB"));
        assert!(message.contains("10 MB"));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_time_parse_error_conversion() {
        let err: ConversionError = TimeParseError::InvalidFormat("abc".to_string()).into();
        assert!(matches!(err, ConversionError::InvalidFormat { ref input } if input == "abc"));
        assert!(err.is_user_error());
    }
}
