//! Conversion request models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crop::CropSpec;
use crate::target::OutputTarget;

/// Unique identifier for a conversion request.
///
/// The chat platform's interaction id is used directly; it also prefixes every
/// temporary artifact the request creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Create from an existing string. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so the id is always safe inside a file name.
    pub fn new(id: impl AsRef<str>) -> Self {
        let sanitized: String = id
            .as_ref()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self(sanitized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the video comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MediaSource {
    /// File uploaded with the command; downloaded to a local temp file.
    Attachment { url: String, filename: String },
    /// Page or media URL; resolved to a direct stream.
    Remote { url: String },
}

impl MediaSource {
    /// Whether the source is fetched to local disk before encoding.
    pub fn is_local_file(&self) -> bool {
        matches!(self, MediaSource::Attachment { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            MediaSource::Attachment { url, .. } | MediaSource::Remote { url } => url,
        }
    }

    /// Lowercase extension of the attachment file name, if any.
    pub fn extension(&self) -> Option<String> {
        match self {
            MediaSource::Attachment { filename, .. } => std::path::Path::new(filename)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase()),
            MediaSource::Remote { .. } => None,
        }
    }
}

/// Unvalidated command input handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub id: RequestId,
    pub source: MediaSource,
    /// Raw start time as typed by the user
    pub start: String,
    /// Raw end time as typed by the user
    pub end: String,
    pub destination: OutputTarget,
    /// Run black-bar detection before encoding
    #[serde(default)]
    pub auto_crop: bool,
}

/// A validated request. Built by the orchestrator once time bounds are known
/// to be consistent with the source; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    id: RequestId,
    input: String,
    is_local_file: bool,
    start_secs: u32,
    duration_secs: u32,
    destination: OutputTarget,
    auto_crop: bool,
}

impl ConversionRequest {
    /// `input` is a local path or a direct stream URL that ffmpeg can open.
    /// Returns `None` for an empty duration.
    pub fn new(
        id: RequestId,
        input: impl Into<String>,
        is_local_file: bool,
        start_secs: u32,
        duration_secs: u32,
        destination: OutputTarget,
        auto_crop: bool,
    ) -> Option<Self> {
        if duration_secs == 0 {
            return None;
        }
        Some(Self {
            id,
            input: input.into(),
            is_local_file,
            start_secs,
            duration_secs,
            destination,
            auto_crop,
        })
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_local_file(&self) -> bool {
        self.is_local_file
    }

    pub fn start_secs(&self) -> u32 {
        self.start_secs
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn end_secs(&self) -> u32 {
        self.start_secs + self.duration_secs
    }

    pub fn destination(&self) -> OutputTarget {
        self.destination
    }

    pub fn auto_crop(&self) -> bool {
        self.auto_crop
    }

    /// The encoding segment for this request with an optional crop.
    pub fn segment(&self, crop: Option<CropSpec>) -> Segment<'_> {
        Segment {
            input: &self.input,
            start_secs: self.start_secs,
            duration_secs: self.duration_secs,
            crop,
        }
    }
}

/// The `[start, start + duration)` slice of an input that every pass reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub input: &'a str,
    pub start_secs: u32,
    pub duration_secs: u32,
    pub crop: Option<CropSpec>,
}
