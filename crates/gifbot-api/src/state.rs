//! Application state.

use std::sync::Arc;

use gifbot_worker::ConversionOrchestrator;

use crate::config::{ApiConfig, DiscordConfig};
use crate::discord::DiscordClient;
use crate::error::ApiResult;
use crate::security::SignatureVerifier;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub verifier: Arc<SignatureVerifier>,
    pub discord: Arc<DiscordClient>,
    pub orchestrator: Arc<ConversionOrchestrator>,
}

impl AppState {
    /// Create new application state around a ready orchestrator.
    pub fn new(
        config: ApiConfig,
        discord: &DiscordConfig,
        orchestrator: ConversionOrchestrator,
    ) -> ApiResult<Self> {
        Ok(Self {
            config,
            verifier: Arc::new(SignatureVerifier::from_hex(&discord.public_key)?),
            discord: Arc::new(DiscordClient::new(discord)?),
            orchestrator: Arc::new(orchestrator),
        })
    }
}
