//! Conversion configuration.

use std::path::PathBuf;
use std::time::Duration;

use gifbot_media::DEFAULT_MAX_DOWNLOAD_BYTES;
use gifbot_models::encoding::{DEFAULT_GIF_FPS, DEFAULT_GIF_WIDTH};
use gifbot_models::{GifEncodingConfig, SizeLimits, MAX_GIF_DURATION_SECS};

/// Conversion configuration. Built once at startup and shared.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Directory holding every request's temporary files
    pub work_dir: PathBuf,
    /// Directory checked for tool binaries before PATH
    pub tools_dir: Option<PathBuf>,
    /// Longest clip accepted, in seconds
    pub max_gif_secs: u32,
    /// Filter parameters for all passes
    pub encoding: GifEncodingConfig,
    /// Byte budgets per output target
    pub limits: SizeLimits,
    /// Deadline for each external tool run
    pub tool_timeout: Duration,
    /// Maximum conversions running at once
    pub max_concurrent: usize,
    /// Cap on downloaded attachments
    pub max_download_bytes: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("gifbot"),
            tools_dir: None,
            max_gif_secs: MAX_GIF_DURATION_SECS,
            encoding: GifEncodingConfig::default(),
            limits: SizeLimits::default(),
            tool_timeout: Duration::from_secs(120),
            max_concurrent: 2,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }
}

impl ConversionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let limits = SizeLimits {
            inline_target_bytes: env_parse("GIFBOT_INLINE_TARGET_BYTES")
                .unwrap_or(defaults.limits.inline_target_bytes),
            inline_limit_bytes: env_parse("GIFBOT_INLINE_LIMIT_BYTES")
                .unwrap_or(defaults.limits.inline_limit_bytes),
            hosted_target_bytes: env_parse("GIFBOT_HOSTED_TARGET_BYTES")
                .unwrap_or(defaults.limits.hosted_target_bytes),
            hosted_limit_bytes: env_parse("GIFBOT_HOSTED_LIMIT_BYTES")
                .unwrap_or(defaults.limits.hosted_limit_bytes),
        };

        Self {
            work_dir: std::env::var("GIFBOT_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            tools_dir: std::env::var("GIFBOT_TOOLS_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            max_gif_secs: env_parse("GIFBOT_MAX_GIF_SECS")
                .filter(|&s: &u32| s > 0)
                .unwrap_or(MAX_GIF_DURATION_SECS),
            encoding: GifEncodingConfig::default()
                .with_fps(env_parse("GIFBOT_FPS").filter(|&f: &u32| f > 0).unwrap_or(DEFAULT_GIF_FPS))
                .with_width(
                    env_parse("GIFBOT_WIDTH")
                        .filter(|&w: &u32| w > 0)
                        .unwrap_or(DEFAULT_GIF_WIDTH),
                ),
            limits,
            tool_timeout: Duration::from_secs(
                env_parse("GIFBOT_TOOL_TIMEOUT_SECS").unwrap_or(120),
            ),
            max_concurrent: env_parse("GIFBOT_MAX_CONCURRENT")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(2),
            max_download_bytes: env_parse("GIFBOT_MAX_DOWNLOAD_BYTES")
                .unwrap_or(DEFAULT_MAX_DOWNLOAD_BYTES),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert_eq!(config.max_gif_secs, 7);
        assert_eq!(config.encoding.fps, 10);
        assert_eq!(config.encoding.width, 320);
        assert_eq!(config.tool_timeout, Duration::from_secs(120));
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.limits.inline_limit_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        assert_eq!(env_parse::<u32>("GIFBOT_TEST_SURELY_UNSET_VAR"), None);
    }
}
