//! Shared data models for GifBot.
//!
//! This crate provides:
//! - Time string parsing for clip ranges
//! - Conversion jobs and validated requests
//! - Output targets with their size policies
//! - GIF encoding configuration and limits

pub mod crop;
pub mod encoding;
pub mod request;
pub mod target;
pub mod time;

// Re-export common types
pub use crop::CropSpec;
pub use encoding::{GifEncodingConfig, SizeLimits, MAX_GIF_DURATION_SECS};
pub use request::{ConversionJob, ConversionRequest, MediaSource, RequestId, Segment};
pub use target::{HostExpiry, OutputTarget, SizePolicy};
pub use time::{format_seconds, parse_time, TimeParseError};
