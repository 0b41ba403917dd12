//! Discord HTTP interactions.

pub mod client;
pub mod commands;
pub mod interaction;

pub use client::{DiscordClient, DiscordResponder};
pub use interaction::{parse_gif_command, Interaction, InteractionResponse};
