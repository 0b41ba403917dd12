//! Two-pass GIF encoding.
//!
//! # Passes
//!
//! 1. **Palette**: `[crop,]fps,scale,palettegen=stats_mode=diff` over the
//!    segment, written to a PNG.
//! 2. **Render**: same chain, quantized against the palette with Bayer
//!    dithering. Audio is dropped, the GIF loops forever and `-fs` makes
//!    ffmpeg stop writing at the size ceiling.
//!
//! When `-fs` cuts the render short ffmpeg may exit non-zero even though the
//! file it wrote is a valid, shorter GIF. That case is reported as
//! [`RenderOutcome::CompletedWithTruncation`], not as an error.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use gifbot_models::{GifEncodingConfig, Segment};

use crate::command::{FfmpegCommand, FfmpegOutput, FfmpegRunner};
use crate::error::{MediaError, MediaResult, MAX_DIAGNOSTIC_CHARS};
use crate::filters::{palette_filter, render_filter};

/// How the render pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// ffmpeg exited cleanly.
    Completed,
    /// ffmpeg stopped early (size ceiling) but left a usable file.
    CompletedWithTruncation { exit_code: Option<i32> },
}

impl RenderOutcome {
    pub fn is_truncated(&self) -> bool {
        matches!(self, RenderOutcome::CompletedWithTruncation { .. })
    }
}

/// A rendered GIF on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedGif {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub outcome: RenderOutcome,
    /// Bounded tail of the render log
    pub diagnostic: String,
}

/// GIF encoder over an ffmpeg runner.
#[derive(Debug, Clone)]
pub struct GifEncoder {
    runner: FfmpegRunner,
    config: GifEncodingConfig,
}

impl GifEncoder {
    pub fn new(runner: FfmpegRunner, config: GifEncodingConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &GifEncodingConfig {
        &self.config
    }

    pub fn runner(&self) -> &FfmpegRunner {
        &self.runner
    }

    /// Build the palette pass command.
    pub fn palette_command(&self, segment: &Segment<'_>, palette: &Path) -> FfmpegCommand {
        FfmpegCommand::new(segment.input, palette)
            .seek(segment.start_secs)
            .duration(segment.duration_secs)
            .video_filter(palette_filter(segment.crop.as_ref(), &self.config))
            .single_image()
    }

    /// Build the render pass command.
    pub fn render_command(
        &self,
        segment: &Segment<'_>,
        palette: &Path,
        output: &Path,
        size_ceiling: u64,
    ) -> FfmpegCommand {
        FfmpegCommand::new(segment.input, output)
            .seek(segment.start_secs)
            .duration(segment.duration_secs)
            .extra_input(palette)
            .lavfi(render_filter(segment.crop.as_ref(), &self.config))
            .no_audio()
            .loop_count(0)
            .max_file_size(size_ceiling)
    }

    /// Palette pass. Fails unless ffmpeg exits cleanly and the palette exists.
    pub async fn generate_palette(&self, segment: &Segment<'_>, palette: &Path) -> MediaResult<()> {
        let cmd = self.palette_command(segment, palette);
        let output = self.runner.run(&cmd).await?;

        let written = file_size(palette).await;
        debug!(
            exit_code = ?output.exit_code,
            palette_bytes = written,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Palette pass finished"
        );

        if !output.success || written == 0 {
            return Err(MediaError::PaletteGenerationFailed {
                diagnostic: failure_diagnostic(&output),
            });
        }

        Ok(())
    }

    /// Render pass.
    pub async fn render(
        &self,
        segment: &Segment<'_>,
        palette: &Path,
        output_path: &Path,
        size_ceiling: u64,
    ) -> MediaResult<EncodedGif> {
        let cmd = self.render_command(segment, palette, output_path, size_ceiling);
        let output = self.runner.run(&cmd).await?;
        let size_bytes = file_size(output_path).await;

        let outcome = classify_render(&output, size_bytes).ok_or_else(|| {
            MediaError::GifRenderFailed {
                diagnostic: failure_diagnostic(&output),
            }
        })?;

        if outcome.is_truncated() {
            warn!(
                exit_code = ?output.exit_code,
                size_bytes,
                size_ceiling,
                "Render stopped early, keeping truncated GIF"
            );
        } else {
            info!(
                size_bytes,
                elapsed_ms = output.elapsed.as_millis() as u64,
                "Render pass finished"
            );
        }

        Ok(EncodedGif {
            path: output_path.to_path_buf(),
            size_bytes,
            outcome,
            diagnostic: output.diagnostic(MAX_DIAGNOSTIC_CHARS),
        })
    }
}

/// Decide the render outcome from exit status and output size.
///
/// Returns `None` when there is no usable output.
pub fn classify_render(output: &FfmpegOutput, size_bytes: u64) -> Option<RenderOutcome> {
    match (output.success, size_bytes) {
        (true, 0) => None,
        (true, _) => Some(RenderOutcome::Completed),
        (false, 0) => None,
        (false, _) => Some(RenderOutcome::CompletedWithTruncation {
            exit_code: output.exit_code,
        }),
    }
}

fn failure_diagnostic(output: &FfmpegOutput) -> String {
    let diagnostic = output.diagnostic(MAX_DIAGNOSTIC_CHARS);
    if diagnostic.is_empty() {
        format!("ffmpeg exited with code {:?} and no output", output.exit_code)
    } else {
        diagnostic
    }
}

/// Size of a file, or 0 when it is missing.
async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gifbot_models::CropSpec;

    fn encoder() -> GifEncoder {
        GifEncoder::new(FfmpegRunner::new("ffmpeg"), GifEncodingConfig::default())
    }

    fn exited(success: bool, code: i32) -> FfmpegOutput {
        FfmpegOutput {
            exit_code: Some(code),
            success,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_render() {
        assert_eq!(classify_render(&exited(true, 0), 1024), Some(RenderOutcome::Completed));
        assert_eq!(classify_render(&exited(true, 0), 0), None);
        assert_eq!(
            classify_render(&exited(false, 1), 1024),
            Some(RenderOutcome::CompletedWithTruncation { exit_code: Some(1) })
        );
        assert_eq!(classify_render(&exited(false, 1), 0), None);
    }

    #[test]
    fn test_render_command_arguments() {
        let crop = CropSpec::new(640, 272, 0, 104);
        let segment = Segment {
            input: "https://cdn.example.com/stream.m3u8",
            start_secs: 5,
            duration_secs: 5,
            crop,
        };
        let args = encoder()
            .render_command(&segment, Path::new("/tmp/p.png"), Path::new("/tmp/o.gif"), 9_961_472)
            .build_args();

        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert_eq!(args[pos("-fs") + 1], "9961472");
        assert_eq!(args[pos("-loop") + 1], "0");
        assert!(args.contains(&"-an".to_string()));
        assert!(args[pos("-lavfi") + 1].starts_with("crop=640:272:0:104,"));
        assert!(args[pos("-lavfi") + 1].contains("paletteuse=dither=bayer:bayer_scale=5"));
    }

    #[test]
    fn test_palette_command_without_crop() {
        let segment = Segment {
            input: "in.mp4",
            start_secs: 0,
            duration_secs: 7,
            crop: None,
        };
        let args = encoder()
            .palette_command(&segment, Path::new("/tmp/p.png"))
            .build_args();
        let pos = |needle: &str| args.iter().position(|a| a == needle).unwrap();
        assert_eq!(
            args[pos("-vf") + 1],
            "fps=10,scale=320:-1:flags=lanczos,palettegen=stats_mode=diff"
        );
    }

    #[tokio::test]
    async fn test_palette_failure_when_tool_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let encoder = GifEncoder::new(
            FfmpegRunner::new(dir.path().join("no-ffmpeg")),
            GifEncodingConfig::default(),
        );
        let segment = Segment {
            input: "in.mp4",
            start_secs: 0,
            duration_secs: 1,
            crop: None,
        };
        let result = encoder
            .generate_palette(&segment, &dir.path().join("p.png"))
            .await;
        assert!(matches!(result, Err(MediaError::Io(_))));
    }
}
