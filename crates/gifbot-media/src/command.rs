//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{tail_excerpt, MediaError, MediaResult};

/// Number of trailing stderr lines kept per run.
const MAX_STDERR_LINES: usize = 2000;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Primary input (local path or URL)
    input: String,
    /// Additional inputs after the primary one
    extra_inputs: Vec<String>,
    /// Output file path, or `-` for none
    output: PathBuf,
    /// Input arguments (before the first -i)
    input_args: Vec<String>,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            extra_inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add another `-i` input after the primary one.
    pub fn extra_input(mut self, input: impl AsRef<Path>) -> Self {
        self.extra_inputs
            .push(input.as_ref().to_string_lossy().to_string());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: u32) -> Self {
        self.input_arg("-ss").input_arg(seconds.to_string())
    }

    /// Set duration (input option, so only the segment is decoded).
    pub fn duration(self, seconds: u32) -> Self {
        self.input_arg("-t").input_arg(seconds.to_string())
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set a filter graph spanning several inputs.
    pub fn lavfi(self, filter: impl Into<String>) -> Self {
        self.output_arg("-lavfi").output_arg(filter)
    }

    /// Drop audio streams.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Set loop count for animated output (0 = forever).
    pub fn loop_count(self, count: i32) -> Self {
        self.output_arg("-loop").output_arg(count.to_string())
    }

    /// Stop writing once the output reaches `bytes`.
    pub fn max_file_size(self, bytes: u64) -> Self {
        self.output_arg("-fs").output_arg(bytes.to_string())
    }

    /// Set output container format.
    pub fn format(self, format: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(format)
    }

    /// Write a single image frame (for palette output).
    pub fn single_image(self) -> Self {
        self.output_arg("-update").output_arg("1")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-nostdin".to_string());

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.clone());

        for extra in &self.extra_inputs {
            args.push("-i".to_string());
            args.push(extra.clone());
        }

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Exit status and captured log of one FFmpeg run.
#[derive(Debug, Clone, Default)]
pub struct FfmpegOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Trailing stderr lines, oldest first
    pub stderr_lines: Vec<String>,
    pub elapsed: Duration,
}

impl FfmpegOutput {
    /// Bounded trailing excerpt of the log for diagnostics.
    pub fn diagnostic(&self, max_chars: usize) -> String {
        tail_excerpt(&self.stderr_lines.join("\n"), max_chars)
    }
}

/// Runner for FFmpeg commands with an optional deadline.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: PathBuf,
    /// Timeout for each run
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a runner for the given ffmpeg binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run an FFmpeg command.
    ///
    /// A non-zero exit is reported in [`FfmpegOutput`], not as an error:
    /// callers decide what a failed exit means. Errors are reserved for
    /// spawn failures and timeouts.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<FfmpegOutput> {
        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.program.display(), args.join(" "));

        let started = Instant::now();
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let collector = tokio::spawn(collect_lines(stderr, MAX_STDERR_LINES));

        let status = self.wait_for_completion(&mut child).await?;

        let stderr_lines = collector
            .await
            .map_err(|e| MediaError::internal(format!("stderr reader failed: {}", e)))?;

        Ok(FfmpegOutput {
            exit_code: status.code(),
            success: status.success(),
            stderr_lines,
            elapsed: started.elapsed(),
        })
    }

    /// Run and turn a non-zero exit into [`MediaError::FfmpegFailed`].
    pub async fn run_checked(&self, cmd: &FfmpegCommand) -> MediaResult<FfmpegOutput> {
        let output = self.run(cmd).await?;
        if output.success {
            Ok(output)
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(output.diagnostic(crate::error::MAX_DIAGNOSTIC_CHARS)),
                output.exit_code,
            ))
        }
    }

    /// Wait for child process with optional timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => Ok(status?),
                Err(_) => {
                    warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "FFmpeg timed out, killing process"
                    );
                    let _ = child.kill().await;
                    Err(MediaError::timeout("ffmpeg", timeout))
                }
            },
            None => Ok(child.wait().await?),
        }
    }
}

/// Read lines until EOF, keeping only the last `max_lines`.
async fn collect_lines<R>(reader: R, max_lines: usize) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut kept = VecDeque::with_capacity(max_lines.min(256));

    while let Ok(Some(line)) = lines.next_line().await {
        if kept.len() == max_lines {
            kept.pop_front();
        }
        kept.push_back(line);
    }

    kept.into_iter().collect()
}
