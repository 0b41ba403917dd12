//! Delivery seam between the pipeline and the chat platform.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// The chat platform refused or failed a message.
#[derive(Debug, Clone, Error)]
#[error("Delivery failed: {0}")]
pub struct DeliveryError(pub String);

impl DeliveryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Where status updates and the final result of one request are sent.
///
/// Each request has exactly one responder. Status updates may be sent any
/// number of times; the final outcome (file, link or failure text) once.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Replace the visible progress text.
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError>;

    /// Final text message (hosted link or failure).
    async fn send_message(&self, text: &str) -> Result<(), DeliveryError>;

    /// Final message with the GIF attached.
    async fn send_file(&self, path: &Path, file_name: &str, text: &str) -> Result<(), DeliveryError>;
}
