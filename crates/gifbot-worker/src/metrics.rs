//! Conversion metrics.
//!
//! - Conversions by outcome class and destination
//! - Per-pass ffmpeg duration
//! - Output GIF size

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Finished conversions by outcome class.
    pub const CONVERSIONS_TOTAL: &str = "gifbot_conversions_total";

    /// Wall time of each ffmpeg pass in seconds.
    pub const FFMPEG_DURATION_SECONDS: &str = "gifbot_ffmpeg_duration_seconds";

    /// Size of rendered GIFs in bytes.
    pub const GIF_BYTES: &str = "gifbot_gif_bytes";

    /// Renders cut short by the size ceiling.
    pub const TRUNCATED_RENDERS_TOTAL: &str = "gifbot_truncated_renders_total";
}

/// Record a finished conversion. `class` is `"delivered"` or an error class.
pub fn record_conversion(class: &str, destination: &str) {
    counter!(
        names::CONVERSIONS_TOTAL,
        "class" => class.to_string(),
        "destination" => destination.to_string()
    )
    .increment(1);
}

/// Record one ffmpeg pass (`crop_detect`, `palette`, `render`).
pub fn record_ffmpeg_pass(pass: &'static str, duration_secs: f64) {
    histogram!(names::FFMPEG_DURATION_SECONDS, "pass" => pass).record(duration_secs);
}

/// Record a rendered GIF.
pub fn record_gif(size_bytes: u64, truncated: bool) {
    histogram!(names::GIF_BYTES).record(size_bytes as f64);
    if truncated {
        counter!(names::TRUNCATED_RENDERS_TOTAL).increment(1);
    }
}
