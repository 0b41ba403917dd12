//! Black-bar crop detection.
//!
//! Runs `cropdetect` over exactly the requested segment and keeps the last
//! rectangle it reports. Detection is advisory: every failure degrades to
//! "no crop" and is only logged.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use gifbot_models::{CropSpec, GifEncodingConfig, Segment};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::filters::cropdetect_filter;

static CROP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"crop=(-?\d+):(-?\d+):(-?\d+):(-?\d+)").expect("valid crop regex")
});

/// Detect letterbox/pillarbox bars in a segment.
///
/// `segment.crop` is ignored; detection always looks at the raw frames.
pub async fn detect_crop(
    runner: &FfmpegRunner,
    segment: &Segment<'_>,
    config: &GifEncodingConfig,
) -> Option<CropSpec> {
    // cropdetect reports at info level.
    let cmd = FfmpegCommand::new(segment.input, "-")
        .seek(segment.start_secs)
        .duration(segment.duration_secs)
        .video_filter(cropdetect_filter(config))
        .no_audio()
        .format("null")
        .log_level("info");

    let output = match runner.run(&cmd).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Crop detection could not run, continuing without crop");
            return None;
        }
    };

    if !output.success {
        warn!(
            exit_code = ?output.exit_code,
            "Crop detection exited with non-zero status, continuing without crop"
        );
        return None;
    }

    match parse_last_crop(&output.stderr_lines) {
        Some(crop) => {
            info!(crop = %crop, "Detected crop");
            Some(crop)
        }
        None => {
            debug!("No usable crop reported");
            None
        }
    }
}

/// Pick the last `crop=W:H:X:Y` reading from a cropdetect log.
///
/// Later readings have seen more of the segment. The last reading is taken
/// even if it is invalid, in which case the result is `None`.
pub fn parse_last_crop<S: AsRef<str>>(lines: &[S]) -> Option<CropSpec> {
    let last = lines
        .iter()
        .rev()
        .find_map(|line| CROP_PATTERN.captures_iter(line.as_ref()).last())?;

    let value = |i: usize| last.get(i)?.as_str().parse::<i64>().ok();
    let (w, h, x, y) = (value(1)?, value(2)?, value(3)?, value(4)?);

    if w <= 0 || h <= 0 || x < 0 || y < 0 {
        debug!(w, h, x, y, "Rejecting invalid crop reading");
        return None;
    }

    CropSpec::new(
        u32::try_from(w).ok()?,
        u32::try_from(h).ok()?,
        u32::try_from(x).ok()?,
        u32::try_from(y).ok()?,
    )
}
