//! Source acquisition.
//!
//! Attachments are downloaded into the request's artifact set and probed for
//! their duration. Remote URLs are resolved to a direct stream and never
//! downloaded.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

use gifbot_media::{ArtifactSet, Downloader, MediaResolver, Prober};
use gifbot_models::MediaSource;

use crate::error::ConversionResult;
use crate::logging::{ConversionStep, StepTimer};

/// A source ready for ffmpeg.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredSource {
    /// Local path or direct stream URL
    pub input: String,
    pub is_local_file: bool,
    /// Total duration in seconds, when known
    pub duration_secs: Option<f64>,
}

/// Turns a [`MediaSource`] into something ffmpeg can read.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Any file written must be registered in `artifacts`.
    async fn acquire(
        &self,
        source: &MediaSource,
        artifacts: &mut ArtifactSet,
    ) -> ConversionResult<AcquiredSource>;
}

/// Production provider backed by reqwest, ffprobe and yt-dlp.
#[derive(Debug, Clone)]
pub struct MediaSourceProvider {
    downloader: Downloader,
    prober: Prober,
    resolver: MediaResolver,
}

impl MediaSourceProvider {
    pub fn new(downloader: Downloader, prober: Prober, resolver: MediaResolver) -> Self {
        Self {
            downloader,
            prober,
            resolver,
        }
    }
}

#[async_trait]
impl SourceProvider for MediaSourceProvider {
    async fn acquire(
        &self,
        source: &MediaSource,
        artifacts: &mut ArtifactSet,
    ) -> ConversionResult<AcquiredSource> {
        let started = Instant::now();
        match source {
            MediaSource::Attachment { url, .. } => {
                let path = artifacts.source_path(source.extension().as_deref());
                StepTimer::start(ConversionStep::Download)
                    .record(self.downloader.download(url, &path).await)?;

                // Unknown duration only relaxes the range check.
                let timer = StepTimer::start(ConversionStep::Measure);
                let duration_secs = match self.prober.probe(&path).await {
                    Ok(info) => {
                        timer.finish();
                        info.duration
                    }
                    Err(e) => {
                        timer.fail(&e);
                        warn!("Treating duration as unknown");
                        None
                    }
                };

                info!(
                    duration = ?duration_secs,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Attachment ready"
                );
                Ok(AcquiredSource {
                    input: path.to_string_lossy().to_string(),
                    is_local_file: true,
                    duration_secs,
                })
            }
            MediaSource::Remote { url } => {
                let resolved = StepTimer::start(ConversionStep::Resolve)
                    .record(self.resolver.resolve(url).await)?;
                Ok(AcquiredSource {
                    input: resolved.stream_url,
                    is_local_file: false,
                    duration_secs: resolved.duration,
                })
            }
        }
    }
}
