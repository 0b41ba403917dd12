//! Crop rectangle model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Crop rectangle in source pixels.
///
/// Only constructed through [`CropSpec::new`], which rejects empty
/// rectangles. "No crop" is represented as `Option::<CropSpec>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSpec {
    width: u32,
    height: u32,
    x: u32,
    y: u32,
}

impl CropSpec {
    /// Create a crop rectangle. Returns `None` when width or height is zero.
    pub fn new(width: u32, height: u32, x: u32, y: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width,
            height,
            x,
            y,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    /// FFmpeg `crop` filter segment.
    pub fn to_filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

impl fmt::Display for CropSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}
