//! Slash command definitions.

use serde_json::{json, Value};

use gifbot_models::{HostExpiry, OutputTarget};

pub const COMMAND_NAME: &str = "gif";

pub const OPT_START: &str = "start";
pub const OPT_END: &str = "end";
pub const OPT_VIDEO: &str = "video";
pub const OPT_URL: &str = "url";
pub const OPT_DESTINATION: &str = "destination";
pub const OPT_CROP: &str = "crop";

/// Application command option types.
mod option_type {
    pub const STRING: u8 = 3;
    pub const BOOLEAN: u8 = 5;
    pub const ATTACHMENT: u8 = 11;
}

/// Body for the bulk-overwrite registration call.
pub fn command_definitions(max_gif_secs: u32) -> Value {
    json!([gif_command(max_gif_secs)])
}

/// The `gif` command. Required options come first.
pub fn gif_command(max_gif_secs: u32) -> Value {
    let mut choices = vec![json!({
        "name": "Discord attachment",
        "value": OutputTarget::InlineAttachment.choice_value(),
    })];
    choices.extend(HostExpiry::ALL.iter().map(|expiry| {
        json!({
            "name": format!("Hosted link ({})", expiry.as_tag()),
            "value": OutputTarget::HostedLink(*expiry).choice_value(),
        })
    }));

    json!({
        "name": COMMAND_NAME,
        "type": 1,
        "description": format!("Turn up to {} seconds of a video into a GIF", max_gif_secs),
        "options": [
            {
                "name": OPT_START,
                "type": option_type::STRING,
                "description": "Start time (SS, MM:SS or HH:MM:SS)",
                "required": true,
            },
            {
                "name": OPT_END,
                "type": option_type::STRING,
                "description": "End time (SS, MM:SS or HH:MM:SS)",
                "required": true,
            },
            {
                "name": OPT_VIDEO,
                "type": option_type::ATTACHMENT,
                "description": "Video file to convert",
            },
            {
                "name": OPT_URL,
                "type": option_type::STRING,
                "description": "Link to a video page or file",
            },
            {
                "name": OPT_DESTINATION,
                "type": option_type::STRING,
                "description": "Where to put the GIF",
                "choices": choices,
            },
            {
                "name": OPT_CROP,
                "type": option_type::BOOLEAN,
                "description": "Remove black bars",
            },
        ],
    })
}
