//! Conversion orchestrator.
//!
//! Runs one request through
//! `Validating → Acquiring → (CropDetecting) → PaletteGenerating → Rendering
//! → SizeChecking → Routing → Delivered | Failed`.
//! Stages only move forward and nothing is retried.
//!
//! Time validation happens before any tool runs or any file exists. Every
//! file created for the request is registered in an [`ArtifactSet`] and
//! removed before [`ConversionOrchestrator::run`] returns, whatever the
//! outcome.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use gifbot_media::{
    ArtifactKind, ArtifactSet, Downloader, FfmpegRunner, GifEncoder, MediaResolver, Prober,
    ToolPaths,
};
use gifbot_models::{
    format_seconds, parse_time, ConversionJob, ConversionRequest, OutputTarget, RequestId,
};
use gifbot_storage::HostUploader;

use crate::config::ConversionConfig;
use crate::error::{ConversionError, ConversionResult};
use crate::logging::{ConversionStep, RequestLogger, StepTimer};
use crate::metrics;
use crate::pipeline::{FfmpegPipeline, GifPipeline};
use crate::responder::Responder;
use crate::router::{Delivery, OutputRouter};
use crate::source::{MediaSourceProvider, SourceProvider};

/// Status shown while waiting for a free conversion slot.
pub const QUEUED_STATUS: &str = "Queued, waiting for a free conversion slot...";

/// Stages of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Validating,
    Acquiring,
    CropDetecting,
    PaletteGenerating,
    Rendering,
    SizeChecking,
    Routing,
    Delivered,
    Failed,
}

impl ConversionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStage::Validating => "validating",
            ConversionStage::Acquiring => "acquiring",
            ConversionStage::CropDetecting => "crop_detecting",
            ConversionStage::PaletteGenerating => "palette_generating",
            ConversionStage::Rendering => "rendering",
            ConversionStage::SizeChecking => "size_checking",
            ConversionStage::Routing => "routing",
            ConversionStage::Delivered => "delivered",
            ConversionStage::Failed => "failed",
        }
    }

    /// Progress text shown to the user on entering this stage.
    pub fn status_text(&self, target: OutputTarget) -> Option<&'static str> {
        match self {
            ConversionStage::Acquiring => Some("Fetching video..."),
            ConversionStage::CropDetecting => Some("Detecting black bars..."),
            ConversionStage::PaletteGenerating => Some("Generating palette..."),
            ConversionStage::Rendering => Some("Rendering GIF..."),
            ConversionStage::Routing if target.is_inline() => Some("Sending GIF..."),
            ConversionStage::Routing => Some("Uploading GIF to temporary hosting..."),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionStage::Delivered | ConversionStage::Failed)
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one orchestration run.
#[derive(Debug)]
pub struct ConversionReport {
    pub id: RequestId,
    /// Last non-terminal stage entered
    pub stage: ConversionStage,
    pub outcome: ConversionResult<Delivery>,
}

impl ConversionReport {
    pub fn is_delivered(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn final_stage(&self) -> ConversionStage {
        if self.is_delivered() {
            ConversionStage::Delivered
        } else {
            ConversionStage::Failed
        }
    }

    /// `"delivered"` or the error class.
    pub fn outcome_class(&self) -> &'static str {
        match &self.outcome {
            Ok(_) => "delivered",
            Err(e) => e.class(),
        }
    }
}

/// Parse both times and check their order and length.
///
/// Returns `(start_secs, duration_secs)`.
pub fn validate_range(start: &str, end: &str, max_secs: u32) -> ConversionResult<(u32, u32)> {
    let start_secs = parse_time(start)?;
    let end_secs = parse_time(end)?;

    if start_secs >= end_secs {
        return Err(ConversionError::out_of_range(format!(
            "the end ({}) must be after the start ({})",
            format_seconds(end_secs),
            format_seconds(start_secs)
        )));
    }

    let duration_secs = end_secs - start_secs;
    if duration_secs > max_secs {
        return Err(ConversionError::DurationExceedsMax {
            requested_secs: duration_secs,
            max_secs,
        });
    }

    Ok((start_secs, duration_secs))
}

/// Check the requested end against the source length, when known.
///
/// The end must not pass the exact length; a 9.6 s video cannot be cut
/// at 0:10.
pub fn check_within_source(end_secs: u32, source_secs: Option<f64>) -> ConversionResult<()> {
    match source_secs {
        Some(total) if f64::from(end_secs) > total => {
            Err(ConversionError::out_of_range(format!(
                "the end ({}) is past the end of the video ({:.1}s)",
                format_seconds(end_secs),
                total
            )))
        }
        _ => Ok(()),
    }
}

/// Runs conversions end to end.
#[derive(Clone)]
pub struct ConversionOrchestrator {
    config: Arc<ConversionConfig>,
    sources: Arc<dyn SourceProvider>,
    pipeline: Arc<dyn GifPipeline>,
    router: OutputRouter,
    permits: Arc<Semaphore>,
}

impl ConversionOrchestrator {
    pub fn new(
        config: Arc<ConversionConfig>,
        sources: Arc<dyn SourceProvider>,
        pipeline: Arc<dyn GifPipeline>,
        uploader: Arc<dyn HostUploader>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        let router = OutputRouter::new(uploader, config.limits);
        Self {
            config,
            sources,
            pipeline,
            router,
            permits,
        }
    }

    /// Wire up the production pipeline from discovered tools.
    pub fn with_tools(
        config: Arc<ConversionConfig>,
        tools: &ToolPaths,
        uploader: Arc<dyn HostUploader>,
    ) -> ConversionResult<Self> {
        let timeout = config.tool_timeout;
        let downloader = Downloader::new(config.max_download_bytes, timeout)?;
        let sources = MediaSourceProvider::new(
            downloader,
            Prober::new(&tools.ffprobe, timeout),
            MediaResolver::new(&tools.yt_dlp, timeout),
        );
        let runner = FfmpegRunner::new(&tools.ffmpeg).with_timeout(timeout);
        let pipeline = FfmpegPipeline::new(GifEncoder::new(runner, config.encoding.clone()));

        Ok(Self::new(
            config,
            Arc::new(sources),
            Arc::new(pipeline),
            uploader,
        ))
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Free conversion slots right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run one conversion. Always returns a report; failures have already
    /// been shown to the user through `responder`.
    pub async fn run(&self, job: ConversionJob, responder: &dyn Responder) -> ConversionReport {
        let logger = RequestLogger::new(&job);
        let span = logger.span();
        self.run_logged(job, responder, logger).instrument(span).await
    }

    async fn run_logged(
        &self,
        job: ConversionJob,
        responder: &dyn Responder,
        logger: RequestLogger,
    ) -> ConversionReport {
        let started = Instant::now();
        logger.log_accepted(&job.start, &job.end, job.auto_crop);

        let mut stage = ConversionStage::Validating;
        let outcome = self.convert(&job, responder, &logger, &mut stage).await;

        match &outcome {
            Ok(delivery) => logger.log_delivered(delivery, started.elapsed()),
            Err(e) => {
                logger.log_failure(e, stage.as_str());
                if let Err(de) = responder.send_message(&e.user_message()).await {
                    logger.log_warning(&format!("Could not send failure message: {}", de));
                }
            }
        }

        let report = ConversionReport {
            id: job.id,
            stage,
            outcome,
        };
        metrics::record_conversion(report.outcome_class(), job.destination.choice_value());
        report
    }

    async fn convert(
        &self,
        job: &ConversionJob,
        responder: &dyn Responder,
        logger: &RequestLogger,
        stage: &mut ConversionStage,
    ) -> ConversionResult<Delivery> {
        let (start_secs, duration_secs) =
            validate_range(&job.start, &job.end, self.config.max_gif_secs)?;

        let _permit = self.acquire_slot(responder, logger).await?;

        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|e| ConversionError::unexpected(format!("work dir unavailable: {}", e)))?;

        let mut artifacts = ArtifactSet::new(&self.config.work_dir, &job.id);
        let result = self
            .encode_and_route(
                job,
                start_secs,
                duration_secs,
                &mut artifacts,
                responder,
                logger,
                stage,
            )
            .await;

        let removed = artifacts.cleanup().await;
        logger.log_cleanup(removed);

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn encode_and_route(
        &self,
        job: &ConversionJob,
        start_secs: u32,
        duration_secs: u32,
        artifacts: &mut ArtifactSet,
        responder: &dyn Responder,
        logger: &RequestLogger,
        stage: &mut ConversionStage,
    ) -> ConversionResult<Delivery> {
        let target = job.destination;

        self.enter(ConversionStage::Acquiring, stage, target, responder, logger)
            .await;
        let acquired = self.sources.acquire(&job.source, artifacts).await?;
        check_within_source(start_secs + duration_secs, acquired.duration_secs)?;

        let request = ConversionRequest::new(
            job.id.clone(),
            acquired.input,
            acquired.is_local_file,
            start_secs,
            duration_secs,
            target,
            job.auto_crop,
        )
        .ok_or_else(|| ConversionError::unexpected("empty segment"))?;

        let crop = if request.auto_crop() {
            self.enter(ConversionStage::CropDetecting, stage, target, responder, logger)
                .await;
            let timer = StepTimer::start(ConversionStep::CropDetect);
            let crop = self.pipeline.detect_crop(&request.segment(None)).await;
            timer.finish();
            logger.log_crop(crop.as_ref());
            crop
        } else {
            None
        };
        let segment = request.segment(crop);

        self.enter(ConversionStage::PaletteGenerating, stage, target, responder, logger)
            .await;
        let palette = artifacts.path(ArtifactKind::Palette);
        StepTimer::start(ConversionStep::Palette)
            .record(self.pipeline.generate_palette(&segment, &palette).await)?;

        self.enter(ConversionStage::Rendering, stage, target, responder, logger)
            .await;
        let output = artifacts.path(ArtifactKind::Gif);
        let policy = target.size_policy(&self.config.limits);
        let gif = StepTimer::start(ConversionStep::Render).record(
            self.pipeline
                .render(&segment, &palette, &output, policy.encoder_ceiling)
                .await,
        )?;
        if gif.outcome.is_truncated() {
            logger.log_truncated(gif.size_bytes, policy.encoder_ceiling);
        }

        self.enter(ConversionStage::SizeChecking, stage, target, responder, logger)
            .await;
        self.router.check_size(&gif, target)?;

        self.enter(ConversionStage::Routing, stage, target, responder, logger)
            .await;
        StepTimer::start(ConversionStep::Deliver)
            .record(self.router.deliver(&gif, target, responder).await)
    }

    async fn acquire_slot(
        &self,
        responder: &dyn Responder,
        logger: &RequestLogger,
    ) -> ConversionResult<OwnedSemaphorePermit> {
        if self.permits.available_permits() == 0 {
            logger.log_queued();
            send_status(responder, logger, QUEUED_STATUS).await;
        }
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ConversionError::unexpected("conversion slots closed"))
    }

    async fn enter(
        &self,
        next: ConversionStage,
        stage: &mut ConversionStage,
        target: OutputTarget,
        responder: &dyn Responder,
        logger: &RequestLogger,
    ) {
        *stage = next;
        logger.log_stage(next.as_str());
        if let Some(text) = next.status_text(target) {
            send_status(responder, logger, text).await;
        }
    }
}

/// Status updates are best effort.
async fn send_status(responder: &dyn Responder, logger: &RequestLogger, text: &str) {
    if let Err(e) = responder.send_status(text).await {
        logger.log_warning(&format!("Status update failed: {}", e));
    }
}
