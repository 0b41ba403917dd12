#![deny(unreachable_patterns)]
//! FFmpeg and yt-dlp CLI wrappers for GIF conversion.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with a per-run deadline
//! - Black-bar crop detection
//! - Two-pass palette GIF encoding with a size ceiling
//! - Remote media resolution, attachment download and probing
//! - Per-request temporary file tracking

pub mod artifacts;
pub mod command;
pub mod crop_detect;
pub mod download;
pub mod error;
pub mod filters;
pub mod gif;
pub mod probe;
pub mod resolve;
pub mod tools;

pub use artifacts::{ArtifactKind, ArtifactSet};
pub use command::{FfmpegCommand, FfmpegOutput, FfmpegRunner};
pub use crop_detect::{detect_crop, parse_last_crop};
pub use download::{Downloader, DEFAULT_MAX_DOWNLOAD_BYTES};
pub use error::{tail_excerpt, MediaError, MediaResult};
pub use gif::{EncodedGif, GifEncoder, RenderOutcome};
pub use probe::{Prober, VideoInfo};
pub use resolve::{MediaResolver, ResolvedMedia};
pub use tools::ToolPaths;
