//! Discord REST client and the per-interaction responder.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use gifbot_worker::{DeliveryError, Responder};

use crate::config::DiscordConfig;
use crate::discord::commands;
use crate::error::{ApiError, ApiResult};

/// Discord rejects message content above this many characters.
const MAX_CONTENT_CHARS: usize = 2000;

/// Client for the few REST calls the bot makes.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: reqwest::Client,
    api_base: String,
    application_id: String,
    bot_token: String,
    guild_id: Option<String>,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            application_id: config.application_id.clone(),
            bot_token: config.bot_token.clone(),
            guild_id: config.guild_id.clone(),
        })
    }

    /// Overwrite the application's commands with the current definitions.
    pub async fn register_commands(&self, max_gif_secs: u32) -> ApiResult<()> {
        let url = match &self.guild_id {
            Some(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, self.application_id, guild
            ),
            None => format!("{}/applications/{}/commands", self.api_base, self.application_id),
        };

        let response = self
            .client
            .put(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&commands::command_definitions(max_gif_secs))
            .send()
            .await
            .map_err(|e| ApiError::discord(format!("command registration failed: {}", e)))?;
        check_status(response).await?;

        info!(guild = ?self.guild_id, "Registered slash commands");
        Ok(())
    }

    fn original_message_url(&self, token: &str) -> String {
        format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.application_id, token
        )
    }

    /// Replace the text of the deferred reply.
    pub async fn edit_original(&self, token: &str, content: &str) -> ApiResult<()> {
        let response = self
            .client
            .patch(self.original_message_url(token))
            .json(&json!({ "content": clamp_content(content) }))
            .send()
            .await
            .map_err(|e| ApiError::discord(e.to_string()))?;
        check_status(response).await
    }

    /// Replace the deferred reply with text plus one attached file.
    pub async fn edit_original_with_file(
        &self,
        token: &str,
        content: &str,
        path: &Path,
        file_name: &str,
    ) -> ApiResult<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to read {}: {}", path.display(), e)))?;
        let size = bytes.len();

        let payload = json!({
            "content": clamp_content(content),
            "attachments": [{ "id": 0, "filename": file_name }],
        });
        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/gif")
            .map_err(|e| ApiError::internal(e.to_string()))?;
        let form = Form::new()
            .text("payload_json", payload.to_string())
            .part("files[0]", file);

        let response = self
            .client
            .patch(self.original_message_url(token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::discord(e.to_string()))?;
        check_status(response).await?;

        debug!(size_bytes = size, file_name, "Attached file to reply");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> ApiResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(300).collect();
    Err(ApiError::discord(format!("HTTP {}: {}", status, excerpt)))
}

fn clamp_content(content: &str) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content.to_string();
    }
    let mut clamped: String = content.chars().take(MAX_CONTENT_CHARS - 1).collect();
    clamped.push('…');
    clamped
}

/// Sends one interaction's progress and result by editing its deferred reply.
#[derive(Debug, Clone)]
pub struct DiscordResponder {
    client: Arc<DiscordClient>,
    token: String,
}

impl DiscordResponder {
    pub fn new(client: Arc<DiscordClient>, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.client
            .edit_original(&self.token, text)
            .await
            .map_err(|e| DeliveryError::new(e.to_string()))
    }

    async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        self.client
            .edit_original(&self.token, text)
            .await
            .map_err(|e| DeliveryError::new(e.to_string()))
    }

    async fn send_file(&self, path: &Path, file_name: &str, text: &str) -> Result<(), DeliveryError> {
        self.client
            .edit_original_with_file(&self.token, text, path, file_name)
            .await
            .map_err(|e| DeliveryError::new(e.to_string()))
    }
}
