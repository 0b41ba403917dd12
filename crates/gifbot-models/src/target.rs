//! Output targets and their size policies.
//!
//! A request either attaches the GIF inline in the chat or uploads it to a
//! temporary host and posts the link. Each target maps to a fixed pair of
//! byte budgets through [`OutputTarget::size_policy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::encoding::SizeLimits;

/// How long a hosted upload stays available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostExpiry {
    /// 1 hour
    Short,
    /// 12 hours
    Medium,
    /// 24 hours
    Long,
    /// 72 hours
    Extended,
}

impl HostExpiry {
    pub const ALL: [HostExpiry; 4] = [
        HostExpiry::Short,
        HostExpiry::Medium,
        HostExpiry::Long,
        HostExpiry::Extended,
    ];

    /// Tag understood by the hosting service.
    pub fn as_tag(&self) -> &'static str {
        match self {
            HostExpiry::Short => "1h",
            HostExpiry::Medium => "12h",
            HostExpiry::Long => "24h",
            HostExpiry::Extended => "72h",
        }
    }

    pub fn duration(&self) -> Duration {
        let hours = match self {
            HostExpiry::Short => 1,
            HostExpiry::Medium => 12,
            HostExpiry::Long => 24,
            HostExpiry::Extended => 72,
        };
        Duration::from_secs(hours * 3600)
    }
}

impl fmt::Display for HostExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Where the finished GIF goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "expiry")]
pub enum OutputTarget {
    /// Attached directly to the chat response.
    #[default]
    InlineAttachment,
    /// Uploaded to a temporary host; the response carries the link.
    HostedLink(HostExpiry),
}

/// Byte budgets for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePolicy {
    /// Passed to the encoder as its output size cutoff (best effort).
    pub encoder_ceiling: u64,
    /// Hard limit checked after encoding; larger files are rejected.
    pub rejection_limit: u64,
}

impl OutputTarget {
    pub fn size_policy(&self, limits: &SizeLimits) -> SizePolicy {
        match self {
            OutputTarget::InlineAttachment => SizePolicy {
                encoder_ceiling: limits.inline_target_bytes,
                rejection_limit: limits.inline_limit_bytes,
            },
            OutputTarget::HostedLink(_) => SizePolicy {
                encoder_ceiling: limits.hosted_target_bytes,
                rejection_limit: limits.hosted_limit_bytes,
            },
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, OutputTarget::InlineAttachment)
    }

    /// Choice value used by the command interface.
    pub fn choice_value(&self) -> &'static str {
        match self {
            OutputTarget::InlineAttachment => "discord",
            OutputTarget::HostedLink(expiry) => expiry.as_tag(),
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::InlineAttachment => f.write_str("inline"),
            OutputTarget::HostedLink(expiry) => write!(f, "hosted ({})", expiry),
        }
    }
}

impl FromStr for OutputTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discord" | "inline" => Ok(OutputTarget::InlineAttachment),
            "1h" | "short" => Ok(OutputTarget::HostedLink(HostExpiry::Short)),
            "12h" | "medium" => Ok(OutputTarget::HostedLink(HostExpiry::Medium)),
            "24h" | "long" => Ok(OutputTarget::HostedLink(HostExpiry::Long)),
            "72h" | "extended" => Ok(OutputTarget::HostedLink(HostExpiry::Extended)),
            other => Err(format!("Unknown destination: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_policy_table() {
        let limits = SizeLimits::default();

        let inline = OutputTarget::InlineAttachment.size_policy(&limits);
        assert_eq!(inline.rejection_limit, limits.inline_limit_bytes);
        assert!(inline.encoder_ceiling < inline.rejection_limit);

        let hosted = OutputTarget::HostedLink(HostExpiry::Long).size_policy(&limits);
        assert_eq!(hosted.rejection_limit, limits.hosted_limit_bytes);
        assert!(hosted.encoder_ceiling > inline.encoder_ceiling);
    }

    #[test]
    fn test_parse_choice_values() {
        for target in [
            OutputTarget::InlineAttachment,
            OutputTarget::HostedLink(HostExpiry::Short),
            OutputTarget::HostedLink(HostExpiry::Extended),
        ] {
            assert_eq!(target.choice_value().parse::<OutputTarget>().unwrap(), target);
        }
        assert!("weekly".parse::<OutputTarget>().is_err());
    }

    #[test]
    fn test_expiry_durations() {
        assert_eq!(HostExpiry::Short.duration(), Duration::from_secs(3600));
        assert_eq!(HostExpiry::Extended.duration(), Duration::from_secs(72 * 3600));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&OutputTarget::HostedLink(HostExpiry::Medium)).unwrap();
        assert_eq!(json, r#"{"kind":"hosted_link","expiry":"medium"}"#);
    }
}
