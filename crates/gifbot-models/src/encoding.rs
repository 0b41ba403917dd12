//! GIF encoding configuration and size limits.

use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;

/// Longest clip that will be converted, in seconds.
pub const MAX_GIF_DURATION_SECS: u32 = 7;

/// Output frame rate.
pub const DEFAULT_GIF_FPS: u32 = 10;
/// Output width in pixels; height follows the source aspect ratio.
pub const DEFAULT_GIF_WIDTH: u32 = 320;
/// Bayer dithering scale passed to `paletteuse`.
pub const DEFAULT_BAYER_SCALE: u8 = 5;

/// `cropdetect` luma threshold.
pub const CROP_DETECT_LIMIT: u32 = 24;
/// `cropdetect` rounding granularity.
pub const CROP_DETECT_ROUND: u32 = 16;
/// `cropdetect` reset interval; 0 keeps one reading across the whole segment.
pub const CROP_DETECT_RESET_FRAMES: u32 = 0;

/// Discord's attachment limit for regular uploads.
pub const INLINE_LIMIT_BYTES: u64 = 10 * MIB;
/// Encoder cutoff for inline GIFs, kept under the attachment limit.
pub const INLINE_TARGET_BYTES: u64 = 9 * MIB + MIB / 2;
/// Hosting service upload ceiling.
pub const HOSTED_LIMIT_BYTES: u64 = 1024 * MIB;
/// Encoder cutoff for hosted GIFs.
pub const HOSTED_TARGET_BYTES: u64 = 200 * MIB;

/// Byte budgets per output target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    #[serde(default = "default_inline_target")]
    pub inline_target_bytes: u64,
    #[serde(default = "default_inline_limit")]
    pub inline_limit_bytes: u64,
    #[serde(default = "default_hosted_target")]
    pub hosted_target_bytes: u64,
    #[serde(default = "default_hosted_limit")]
    pub hosted_limit_bytes: u64,
}

fn default_inline_target() -> u64 {
    INLINE_TARGET_BYTES
}
fn default_inline_limit() -> u64 {
    INLINE_LIMIT_BYTES
}
fn default_hosted_target() -> u64 {
    HOSTED_TARGET_BYTES
}
fn default_hosted_limit() -> u64 {
    HOSTED_LIMIT_BYTES
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            inline_target_bytes: INLINE_TARGET_BYTES,
            inline_limit_bytes: INLINE_LIMIT_BYTES,
            hosted_target_bytes: HOSTED_TARGET_BYTES,
            hosted_limit_bytes: HOSTED_LIMIT_BYTES,
        }
    }
}

/// Filter parameters shared by the crop, palette and render passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifEncodingConfig {
    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Output width (lanczos scaled, aspect preserved)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Ordered dithering scale (0-5)
    #[serde(default = "default_bayer_scale")]
    pub bayer_scale: u8,

    /// Crop detection luma threshold
    #[serde(default = "default_crop_limit")]
    pub crop_limit: u32,

    /// Crop detection rounding
    #[serde(default = "default_crop_round")]
    pub crop_round: u32,

    /// Frames between crop detection resets (0 = never)
    #[serde(default = "default_crop_reset")]
    pub crop_reset: u32,
}

fn default_fps() -> u32 {
    DEFAULT_GIF_FPS
}
fn default_width() -> u32 {
    DEFAULT_GIF_WIDTH
}
fn default_bayer_scale() -> u8 {
    DEFAULT_BAYER_SCALE
}
fn default_crop_limit() -> u32 {
    CROP_DETECT_LIMIT
}
fn default_crop_round() -> u32 {
    CROP_DETECT_ROUND
}
fn default_crop_reset() -> u32 {
    CROP_DETECT_RESET_FRAMES
}

impl Default for GifEncodingConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_GIF_FPS,
            width: DEFAULT_GIF_WIDTH,
            bayer_scale: DEFAULT_BAYER_SCALE,
            crop_limit: CROP_DETECT_LIMIT,
            crop_round: CROP_DETECT_ROUND,
            crop_reset: CROP_DETECT_RESET_FRAMES,
        }
    }
}

impl GifEncodingConfig {
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }
}
