//! Discord interactions server.
//!
//! This crate provides:
//! - Signed interaction handling for the `gif` slash command
//! - Progressive replies by editing the deferred response
//! - Command registration at startup
//! - Health and Prometheus endpoints

pub mod config;
pub mod discord;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::{ApiConfig, DiscordConfig};
pub use discord::{DiscordClient, DiscordResponder};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use security::SignatureVerifier;
pub use state::AppState;
