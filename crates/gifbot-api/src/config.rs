//! API configuration.

use crate::error::{ApiError, ApiResult};

/// Default Discord REST base URL.
pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Max request body size
    pub max_body_size: usize,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_size: 1024 * 1024, // 1MB
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

/// Discord application credentials.
#[derive(Clone)]
pub struct DiscordConfig {
    pub application_id: String,
    pub bot_token: String,
    /// Hex-encoded ed25519 key used to verify interaction requests
    pub public_key: String,
    /// Register commands in this guild only (instant updates while developing)
    pub guild_id: Option<String>,
    pub api_base: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("application_id", &self.application_id)
            .field("bot_token", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("guild_id", &self.guild_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DiscordConfig {
    /// Create config from environment variables. The application id, bot
    /// token and public key are required.
    pub fn from_env() -> ApiResult<Self> {
        Ok(Self {
            application_id: required("DISCORD_APPLICATION_ID")?,
            bot_token: required("DISCORD_BOT_TOKEN")?,
            public_key: required("DISCORD_PUBLIC_KEY")?,
            guild_id: optional("DISCORD_GUILD_ID"),
            api_base: optional("DISCORD_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string()),
        })
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(name: &str) -> ApiResult<String> {
    optional(name).ok_or_else(|| ApiError::config(format!("{} must be set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = DiscordConfig {
            application_id: "123".to_string(),
            bot_token: "secret-token".to_string(),
            public_key: "ab".to_string(),
            guild_id: None,
            api_base: DEFAULT_DISCORD_API_BASE.to_string(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_missing_required_variable() {
        let err = required("GIFBOT_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ApiError::Config(ref msg) if msg.contains("must be set")));
    }
}
