//! In-memory fakes for the pipeline seams.

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use gifbot_media::{ArtifactSet, EncodedGif, MediaError, MediaResult, RenderOutcome};
use gifbot_models::{CropSpec, HostExpiry, MediaSource, Segment};
use gifbot_storage::{HostUploader, StorageError, StorageResult};

use crate::error::{ConversionError, ConversionResult};
use crate::pipeline::GifPipeline;
use crate::responder::{DeliveryError, Responder};
use crate::source::{AcquiredSource, SourceProvider};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Status(String),
    Message(String),
    File {
        name: String,
        text: String,
        size_bytes: u64,
    },
}

#[derive(Debug, Default)]
pub struct FakeResponder {
    sent: Mutex<Vec<Sent>>,
}

impl FakeResponder {
    pub fn all(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Everything except status updates.
    pub fn finals(&self) -> Vec<Sent> {
        self.all()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Status(_)))
            .collect()
    }
}

#[async_trait]
impl Responder for FakeResponder {
    async fn send_status(&self, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(Sent::Status(text.to_string()));
        Ok(())
    }

    async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(Sent::Message(text.to_string()));
        Ok(())
    }

    async fn send_file(&self, path: &Path, file_name: &str, text: &str) -> Result<(), DeliveryError> {
        let size_bytes = std::fs::metadata(path)
            .map_err(|e| DeliveryError::new(e.to_string()))?
            .len();
        self.sent.lock().unwrap().push(Sent::File {
            name: file_name.to_string(),
            text: text.to_string(),
            size_bytes,
        });
        Ok(())
    }
}

pub struct FakeUploader {
    url: Option<String>,
    max_bytes: u64,
    calls: AtomicUsize,
    expiries: Mutex<Vec<HostExpiry>>,
}

impl FakeUploader {
    pub fn ok(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            max_bytes: u64::MAX,
            calls: AtomicUsize::new(0),
            expiries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            ..Self::ok("")
        }
    }

    pub fn with_max(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn expiries(&self) -> Vec<HostExpiry> {
        self.expiries.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostUploader for FakeUploader {
    fn max_upload_bytes(&self) -> u64 {
        self.max_bytes
    }

    async fn upload(&self, _path: &Path, expiry: HostExpiry) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.expiries.lock().unwrap().push(expiry);
        self.url
            .clone()
            .ok_or_else(|| StorageError::rejected("HTTP 500: server error"))
    }
}

/// Source that "downloads" a few bytes into the artifact set.
pub struct FakeSource {
    duration_secs: Option<f64>,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_duration(duration_secs: Option<f64>) -> Self {
        Self {
            duration_secs,
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_duration(None)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for FakeSource {
    async fn acquire(
        &self,
        source: &MediaSource,
        artifacts: &mut ArtifactSet,
    ) -> ConversionResult<AcquiredSource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ConversionError::source_unavailable("yt-dlp failed: Video unavailable"));
        }
        if source.is_local_file() {
            let path = artifacts.source_path(source.extension().as_deref());
            tokio::fs::write(&path, b"not really a video")
                .await
                .map_err(|e| ConversionError::unexpected(e.to_string()))?;
            Ok(AcquiredSource {
                input: path.to_string_lossy().to_string(),
                is_local_file: true,
                duration_secs: self.duration_secs,
            })
        } else {
            Ok(AcquiredSource {
                input: "https://cdn.example.com/direct.mp4".to_string(),
                is_local_file: false,
                duration_secs: self.duration_secs,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    pub pass: &'static str,
    pub input: String,
    pub start_secs: u32,
    pub duration_secs: u32,
    pub crop: Option<CropSpec>,
    pub size_ceiling: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderBehavior {
    Complete,
    Truncate,
    Fail,
}

/// Pipeline writing placeholder files of a chosen size.
pub struct FakePipeline {
    crop: Option<CropSpec>,
    gif_bytes: u64,
    palette_fails: bool,
    render: RenderBehavior,
    passes: Mutex<Vec<PassRecord>>,
}

impl FakePipeline {
    pub fn producing(gif_bytes: u64) -> Self {
        Self {
            crop: None,
            gif_bytes,
            palette_fails: false,
            render: RenderBehavior::Complete,
            passes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_crop(mut self, crop: CropSpec) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn with_failing_palette(mut self) -> Self {
        self.palette_fails = true;
        self
    }

    pub fn with_render(mut self, render: RenderBehavior) -> Self {
        self.render = render;
        self
    }

    pub fn passes(&self) -> Vec<PassRecord> {
        self.passes.lock().unwrap().clone()
    }

    fn record(&self, pass: &'static str, segment: &Segment<'_>, size_ceiling: Option<u64>) {
        self.passes.lock().unwrap().push(PassRecord {
            pass,
            input: segment.input.to_string(),
            start_secs: segment.start_secs,
            duration_secs: segment.duration_secs,
            crop: segment.crop,
            size_ceiling,
        });
    }
}

#[async_trait]
impl GifPipeline for FakePipeline {
    async fn detect_crop(&self, segment: &Segment<'_>) -> Option<CropSpec> {
        self.record("crop_detect", segment, None);
        self.crop
    }

    async fn generate_palette(&self, segment: &Segment<'_>, palette: &Path) -> MediaResult<()> {
        self.record("palette", segment, None);
        if self.palette_fails {
            return Err(MediaError::PaletteGenerationFailed {
                diagnostic: "Invalid data found when processing input".to_string(),
            });
        }
        tokio::fs::write(palette, b"PNG").await?;
        Ok(())
    }

    async fn render(
        &self,
        segment: &Segment<'_>,
        _palette: &Path,
        output: &Path,
        size_ceiling: u64,
    ) -> MediaResult<EncodedGif> {
        self.record("render", segment, Some(size_ceiling));
        let outcome = match self.render {
            RenderBehavior::Fail => {
                return Err(MediaError::GifRenderFailed {
                    diagnostic: "Conversion failed!".to_string(),
                })
            }
            RenderBehavior::Complete => RenderOutcome::Completed,
            RenderBehavior::Truncate => RenderOutcome::CompletedWithTruncation { exit_code: Some(1) },
        };
        let file = std::fs::File::create(output)?;
        file.set_len(self.gif_bytes)?;
        Ok(EncodedGif {
            path: output.to_path_buf(),
            size_bytes: self.gif_bytes,
            outcome,
            diagnostic: String::new(),
        })
    }
}

/// Log lines written while a [`capture_logs`] guard is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's logs into a buffer until the guard drops.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
