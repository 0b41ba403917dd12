//! Request verification and input validation.
//!
//! This module provides:
//! - ed25519 verification of interaction requests
//! - Source URL validation (SSRF protection)
//! - Attachment file type checks

use std::sync::LazyLock;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use regex::Regex;
use tracing::warn;
use url::{Host, Url};

use crate::error::{ApiError, ApiResult};

/// Maximum URL length accepted from a command.
const MAX_URL_LENGTH: usize = 2048;

/// Video containers accepted as attachments.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "gif"];

/// Blocked URL patterns (internal hosts and metadata endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://127\.",
        r"^https?://localhost",
        r"^https?://0\.0\.0\.0",
        r"^https?://10\.",
        r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.",
        r"^https?://192\.168\.",
        r"^https?://169\.254\.",
        r"^https?://\[::1\]",
        r"^https?://\[fd",
        r"^https?://\[fe80",
        r"^https?://metadata\.",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Verifies Discord's `X-Signature-Ed25519` header.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build from the application's hex-encoded public key.
    pub fn from_hex(public_key: &str) -> ApiResult<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| ApiError::config(format!("DISCORD_PUBLIC_KEY is not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ApiError::config("DISCORD_PUBLIC_KEY must be 32 bytes"))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ApiError::config(format!("DISCORD_PUBLIC_KEY is invalid: {}", e)))?;
        Ok(Self { key })
    }

    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Check `signature_hex` over `timestamp || body`.
    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> ApiResult<()> {
        let signature = hex::decode(signature_hex.trim())
            .ok()
            .and_then(|bytes| Signature::from_slice(&bytes).ok())
            .ok_or_else(|| ApiError::unauthorized("malformed request signature"))?;

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| ApiError::unauthorized("invalid request signature"))
    }
}

/// Validate a source URL typed by the user. Returns the trimmed URL.
///
/// Only http(s) is allowed, and hosts on loopback, private or link-local
/// networks are rejected.
pub fn validate_source_url(url: &str) -> Result<String, String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("The URL cannot be empty.".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(format!(
            "The URL is longer than {} characters.",
            MAX_URL_LENGTH
        ));
    }

    let parsed = Url::parse(url).map_err(|e| format!("That is not a valid URL ({}).", e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(format!(
                "Unsupported URL scheme `{}`. Only http and https links work.",
                scheme
            ))
        }
    }

    let lowered = url.to_ascii_lowercase();
    let blocked = BLOCKED_PATTERNS.iter().any(|p| p.is_match(&lowered))
        || match parsed.host() {
            Some(Host::Ipv4(ip)) => {
                ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
            }
            Some(Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            None => return Err("The URL must name a host.".to_string()),
        };
    if blocked {
        warn!(url = %url, "Blocked URL pointing at an internal host");
        return Err("That URL points at a private or local address.".to_string());
    }

    Ok(url.to_string())
}

/// Whether an attachment's file name has an accepted video extension.
pub fn is_allowed_attachment(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}
