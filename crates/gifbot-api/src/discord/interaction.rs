//! Interaction payloads and the `gif` command parser.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use gifbot_models::{ConversionJob, MediaSource, OutputTarget, RequestId};

use crate::discord::commands::{self, COMMAND_NAME};
use crate::error::{ApiError, ApiResult};
use crate::security::{is_allowed_attachment, validate_source_url, ALLOWED_EXTENSIONS};

/// Interaction types we handle.
pub mod kind {
    pub const PING: u8 = 1;
    pub const APPLICATION_COMMAND: u8 = 2;
}

/// Interaction response types we send.
pub mod response_kind {
    pub const PONG: u8 = 1;
    pub const CHANNEL_MESSAGE: u8 = 4;
    pub const DEFERRED_CHANNEL_MESSAGE: u8 = 5;
}

/// Message flag: only the invoking user sees the message.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

const MIB: f64 = 1024.0 * 1024.0;

/// Incoming interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    /// Continuation token for follow-up edits
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Option<ResolvedData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub attachments: HashMap<String, Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Immediate reply to an interaction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseData {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: response_kind::PONG,
            data: None,
        }
    }

    /// "Bot is thinking"; the result arrives later as an edit.
    pub fn deferred() -> Self {
        Self {
            kind: response_kind::DEFERRED_CHANNEL_MESSAGE,
            data: None,
        }
    }

    /// Message visible only to the invoking user.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            kind: response_kind::CHANNEL_MESSAGE,
            data: Some(ResponseData {
                content: content.into(),
                flags: Some(EPHEMERAL_FLAG),
            }),
        }
    }
}

impl CommandData {
    fn option(&self, name: &str) -> Option<&serde_json::Value> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    fn string_option(&self, name: &str) -> Option<String> {
        self.option(name)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(|v| v.as_bool())
    }

    fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.resolved.as_ref()?.attachments.get(id)
    }
}

/// Turn a `gif` command into an unvalidated conversion job.
///
/// Checks everything knowable without touching the source: option presence,
/// attachment type and reported size, URL safety and destination. Time
/// strings are passed through untouched. Failures are
/// [`ApiError::Validation`] with text meant for the user.
pub fn parse_gif_command(
    interaction: &Interaction,
    max_attachment_bytes: u64,
) -> ApiResult<ConversionJob> {
    let data = interaction
        .data
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("command interaction without data"))?;
    if data.name != COMMAND_NAME {
        return Err(ApiError::validation(format!("Unknown command `{}`.", data.name)));
    }

    let start = data
        .string_option(commands::OPT_START)
        .ok_or_else(|| ApiError::validation("A start time is required."))?;
    let end = data
        .string_option(commands::OPT_END)
        .ok_or_else(|| ApiError::validation("An end time is required."))?;

    let video = data.string_option(commands::OPT_VIDEO);
    let url = data.string_option(commands::OPT_URL);
    let source = match (video, url) {
        (Some(attachment_id), None) => {
            let attachment = data
                .attachment(&attachment_id)
                .ok_or_else(|| ApiError::validation("The attached video could not be found."))?;
            if !is_allowed_attachment(&attachment.filename) {
                return Err(ApiError::validation(format!(
                    "`{}` is not a supported video file. Use one of: {}.",
                    attachment.filename,
                    ALLOWED_EXTENSIONS.join(", ")
                )));
            }
            // Attachments without a reported size are still capped by the download.
            if let Some(size) = attachment.size.filter(|&s| s > max_attachment_bytes) {
                return Err(ApiError::validation(format!(
                    "`{}` is {:.1} MB, over the {:.0} MB limit for videos.",
                    attachment.filename,
                    size as f64 / MIB,
                    max_attachment_bytes as f64 / MIB
                )));
            }
            MediaSource::Attachment {
                url: attachment.url.clone(),
                filename: attachment.filename.clone(),
            }
        }
        (None, Some(url)) => MediaSource::Remote {
            url: validate_source_url(&url).map_err(ApiError::validation)?,
        },
        (Some(_), Some(_)) => {
            return Err(ApiError::validation(
                "Give either a video attachment or a URL, not both.",
            ))
        }
        (None, None) => {
            return Err(ApiError::validation(
                "Attach a video or give a URL to convert.",
            ))
        }
    };

    let destination = match data.string_option(commands::OPT_DESTINATION) {
        Some(choice) => choice.parse::<OutputTarget>().map_err(ApiError::validation)?,
        None => OutputTarget::default(),
    };

    Ok(ConversionJob {
        id: RequestId::new(&interaction.id),
        source,
        start,
        end,
        destination,
        auto_crop: data.bool_option(commands::OPT_CROP).unwrap_or(false),
    })
}
