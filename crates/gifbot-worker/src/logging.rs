//! Per-conversion logging.
//!
//! [`RequestLogger`] emits the request-level lines (accepted, stage changes,
//! outcome) with the request id, source kind and destination on each.
//! [`StepTimer`] times one pipeline step (download, duration measurement,
//! resolve, crop detection, palette, render, delivery) and logs how long it
//! took; its lines pick the request fields up from the enclosing span.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn, Span};

use gifbot_models::{ConversionJob, CropSpec};

use crate::error::ConversionError;
use crate::router::Delivery;

/// Timed unit of work inside a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStep {
    Download,
    Measure,
    Resolve,
    CropDetect,
    Palette,
    Render,
    Deliver,
}

impl ConversionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStep::Download => "download",
            ConversionStep::Measure => "measure",
            ConversionStep::Resolve => "resolve",
            ConversionStep::CropDetect => "crop_detect",
            ConversionStep::Palette => "palette",
            ConversionStep::Render => "render",
            ConversionStep::Deliver => "deliver",
        }
    }
}

impl fmt::Display for ConversionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running timer for one [`ConversionStep`].
#[derive(Debug)]
#[must_use = "a step timer logs nothing until it is finished"]
pub struct StepTimer {
    step: ConversionStep,
    started: Instant,
}

impl StepTimer {
    pub fn start(step: ConversionStep) -> Self {
        debug!(step = %step, "Step started");
        Self {
            step,
            started: Instant::now(),
        }
    }

    pub fn step(&self) -> ConversionStep {
        self.step
    }

    /// Log success and return the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        info!(
            step = %self.step,
            elapsed_ms = elapsed.as_millis() as u64,
            "Step finished"
        );
        elapsed
    }

    /// Log failure and return the elapsed time.
    pub fn fail(self, error: &dyn fmt::Display) -> Duration {
        let elapsed = self.started.elapsed();
        warn!(
            step = %self.step,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Step failed"
        );
        elapsed
    }

    /// Finish or fail depending on `result`, passing it through.
    pub fn record<T, E: fmt::Display>(self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => {
                self.finish();
            }
            Err(e) => {
                self.fail(e);
            }
        }
        result
    }
}

/// Request-level logger for one conversion.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    source: &'static str,
    target: &'static str,
}

impl RequestLogger {
    pub fn new(job: &ConversionJob) -> Self {
        Self {
            request_id: job.id.to_string(),
            source: if job.source.is_local_file() {
                "attachment"
            } else {
                "url"
            },
            target: job.destination.choice_value(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// `attachment` or `url`.
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Destination choice value (`discord`, `1h`, `12h`, `24h`, `72h`).
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "conversion",
            request_id = %self.request_id,
            source = self.source,
            target = self.target
        )
    }

    pub fn log_accepted(&self, start: &str, end: &str, auto_crop: bool) {
        info!(
            request_id = %self.request_id,
            source = self.source,
            target = self.target,
            start = %start,
            end = %end,
            auto_crop,
            "Conversion accepted"
        );
    }

    pub fn log_queued(&self) {
        info!(request_id = %self.request_id, "All conversion slots busy, queued");
    }

    pub fn log_stage(&self, stage: &str) {
        info!(request_id = %self.request_id, stage = %stage, "Stage entered");
    }

    pub fn log_crop(&self, crop: Option<&CropSpec>) {
        match crop {
            Some(crop) => {
                info!(request_id = %self.request_id, crop = %crop, "Cropping black bars")
            }
            None => info!(request_id = %self.request_id, "No black bars found"),
        }
    }

    pub fn log_truncated(&self, size_bytes: u64, ceiling_bytes: u64) {
        warn!(
            request_id = %self.request_id,
            size_bytes,
            ceiling_bytes,
            "Render stopped at the size ceiling"
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(request_id = %self.request_id, "{}", message);
    }

    pub fn log_delivered(&self, delivery: &Delivery, elapsed: Duration) {
        let (kind, size_bytes) = match delivery {
            Delivery::Attachment { size_bytes } => ("attachment", Some(*size_bytes)),
            Delivery::Link { .. } => ("link", None),
        };
        info!(
            request_id = %self.request_id,
            target = self.target,
            delivery = kind,
            size_bytes = ?size_bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            "Conversion delivered"
        );
    }

    pub fn log_failure(&self, err: &ConversionError, stage: &str) {
        error!(
            request_id = %self.request_id,
            source = self.source,
            target = self.target,
            class = err.class(),
            stage = %stage,
            "Conversion failed: {}", err
        );
    }

    pub fn log_cleanup(&self, removed: usize) {
        debug!(request_id = %self.request_id, removed, "Removed temporary files");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;

    use gifbot_models::{HostExpiry, MediaSource, OutputTarget, RequestId};

    fn capture(f: impl FnOnce()) -> String {
        let (logs, guard) = capture_logs();
        f();
        drop(guard);
        logs.text()
    }

    fn job(source: MediaSource, destination: OutputTarget) -> ConversionJob {
        ConversionJob {
            id: RequestId::new("1180000000000000000"),
            source,
            start: "0:05".to_string(),
            end: "0:10".to_string(),
            destination,
            auto_crop: true,
        }
    }

    #[test]
    fn test_logger_labels_source_and_target() {
        let attachment = RequestLogger::new(&job(
            MediaSource::Attachment {
                url: "https://cdn.example.com/a.mp4".to_string(),
                filename: "a.mp4".to_string(),
            },
            OutputTarget::InlineAttachment,
        ));
        assert_eq!(attachment.request_id(), "1180000000000000000");
        assert_eq!(attachment.source(), "attachment");
        assert_eq!(attachment.target(), "discord");

        let remote = RequestLogger::new(&job(
            MediaSource::Remote {
                url: "https://example.com/watch?v=1".to_string(),
            },
            OutputTarget::HostedLink(HostExpiry::Long),
        ));
        assert_eq!(remote.source(), "url");
        assert_eq!(remote.target(), "24h");
    }

    #[test]
    fn test_step_names() {
        let names: Vec<_> = [
            ConversionStep::Download,
            ConversionStep::Measure,
            ConversionStep::Resolve,
            ConversionStep::CropDetect,
            ConversionStep::Palette,
            ConversionStep::Render,
            ConversionStep::Deliver,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(
            names,
            ["download", "measure", "resolve", "crop_detect", "palette", "render", "deliver"]
        );
    }

    #[test]
    fn test_step_timer_logs_step_and_elapsed() {
        let logs = capture(|| {
            let timer = StepTimer::start(ConversionStep::Palette);
            assert_eq!(timer.step(), ConversionStep::Palette);
            timer.finish();

            let failed: Result<(), &str> =
                StepTimer::start(ConversionStep::Render).record(Err("exit 1"));
            assert!(failed.is_err());
        });

        assert!(logs.contains("Step finished"), "{}", logs);
        assert!(logs.contains("step=palette"), "{}", logs);
        assert!(logs.contains("elapsed_ms="), "{}", logs);
        assert!(logs.contains("Step failed"), "{}", logs);
        assert!(logs.contains("step=render"), "{}", logs);
        assert!(logs.contains("exit 1"), "{}", logs);
    }

    #[test]
    fn test_failure_line_carries_class_and_stage() {
        let logger = RequestLogger::new(&job(
            MediaSource::Remote {
                url: "https://example.com/watch?v=1".to_string(),
            },
            OutputTarget::InlineAttachment,
        ));
        let logs = capture(|| {
            logger.log_failure(
                &ConversionError::source_unavailable("video is private"),
                "acquiring",
            );
        });

        assert!(logs.contains("class=\"source_unavailable\""), "{}", logs);
        assert!(logs.contains("stage=acquiring"), "{}", logs);
        assert!(logs.contains("source=\"url\""), "{}", logs);
        assert!(logs.contains("video is private"), "{}", logs);
    }
}
