//! Encoding seam over the ffmpeg passes.

use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;

use gifbot_media::{detect_crop, EncodedGif, GifEncoder, MediaResult};
use gifbot_models::{CropSpec, Segment};

use crate::metrics;

/// The three ffmpeg passes a conversion can run.
#[async_trait]
pub trait GifPipeline: Send + Sync {
    /// Never fails; `None` means "encode uncropped".
    async fn detect_crop(&self, segment: &Segment<'_>) -> Option<CropSpec>;

    async fn generate_palette(&self, segment: &Segment<'_>, palette: &Path) -> MediaResult<()>;

    async fn render(
        &self,
        segment: &Segment<'_>,
        palette: &Path,
        output: &Path,
        size_ceiling: u64,
    ) -> MediaResult<EncodedGif>;
}

/// Production pipeline running real ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegPipeline {
    encoder: GifEncoder,
}

impl FfmpegPipeline {
    pub fn new(encoder: GifEncoder) -> Self {
        Self { encoder }
    }
}

#[async_trait]
impl GifPipeline for FfmpegPipeline {
    async fn detect_crop(&self, segment: &Segment<'_>) -> Option<CropSpec> {
        let started = Instant::now();
        let crop = detect_crop(self.encoder.runner(), segment, self.encoder.config()).await;
        metrics::record_ffmpeg_pass("crop_detect", started.elapsed().as_secs_f64());
        crop
    }

    async fn generate_palette(&self, segment: &Segment<'_>, palette: &Path) -> MediaResult<()> {
        let started = Instant::now();
        let result = self.encoder.generate_palette(segment, palette).await;
        metrics::record_ffmpeg_pass("palette", started.elapsed().as_secs_f64());
        result
    }

    async fn render(
        &self,
        segment: &Segment<'_>,
        palette: &Path,
        output: &Path,
        size_ceiling: u64,
    ) -> MediaResult<EncodedGif> {
        let started = Instant::now();
        let result = self
            .encoder
            .render(segment, palette, output, size_ceiling)
            .await;
        metrics::record_ffmpeg_pass("render", started.elapsed().as_secs_f64());
        if let Ok(gif) = &result {
            metrics::record_gif(gif.size_bytes, gif.outcome.is_truncated());
        }
        result
    }
}
