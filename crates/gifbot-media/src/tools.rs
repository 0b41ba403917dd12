//! External tool discovery.
//!
//! Resolved once at startup. A binary in the configured tools directory wins
//! over one found on `PATH`; a tool found in neither place is a startup error.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{MediaError, MediaResult};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const YT_DLP: &str = "yt-dlp";

/// Absolute locations of every external binary the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub yt_dlp: PathBuf,
}

impl ToolPaths {
    /// Locate all tools, preferring `tools_dir` when given.
    pub fn discover(tools_dir: Option<&Path>) -> MediaResult<Self> {
        let paths = Self {
            ffmpeg: locate(FFMPEG, tools_dir)?,
            ffprobe: locate(FFPROBE, tools_dir)?,
            yt_dlp: locate(YT_DLP, tools_dir)?,
        };
        info!(
            ffmpeg = %paths.ffmpeg.display(),
            ffprobe = %paths.ffprobe.display(),
            yt_dlp = %paths.yt_dlp.display(),
            "Resolved external tools"
        );
        Ok(paths)
    }
}

/// Locate one tool.
pub fn locate(name: &str, tools_dir: Option<&Path>) -> MediaResult<PathBuf> {
    if let Some(dir) = tools_dir {
        let local = dir.join(executable_name(name));
        if local.is_file() {
            return Ok(local);
        }
    }
    which::which(name).map_err(|_| MediaError::tool_not_found(name))
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}
