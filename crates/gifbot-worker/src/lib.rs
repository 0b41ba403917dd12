//! GIF conversion pipeline.
//!
//! This crate provides:
//! - Time range validation and the per-request stage machine
//! - Source acquisition (attachment download, URL resolution)
//! - Output routing between inline attachments and hosted links
//! - Concurrency limits, structured request logging and metrics

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod responder;
pub mod router;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::ConversionConfig;
pub use error::{ConversionError, ConversionResult};
pub use logging::{ConversionStep, RequestLogger, StepTimer};
pub use orchestrator::{ConversionOrchestrator, ConversionReport, ConversionStage};
pub use pipeline::{FfmpegPipeline, GifPipeline};
pub use responder::{DeliveryError, Responder};
pub use router::{Delivery, OutputRouter};
pub use source::{AcquiredSource, MediaSourceProvider, SourceProvider};
