//! Output routing: inline attachment or hosted link.
//!
//! The size decision here is authoritative; the encoder's ceiling is only a
//! best-effort cutoff.

use std::sync::Arc;
use tracing::info;

use gifbot_media::EncodedGif;
use gifbot_models::{HostExpiry, OutputTarget, SizeLimits};
use gifbot_storage::HostUploader;

use crate::error::{ConversionError, ConversionResult};
use crate::responder::Responder;

/// File name shown for inline attachments.
pub const ATTACHMENT_NAME: &str = "clip.gif";

/// How a GIF reached the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Attachment { size_bytes: u64 },
    Link { url: String, expiry: HostExpiry },
}

/// Chooses and performs delivery for a rendered GIF.
#[derive(Clone)]
pub struct OutputRouter {
    uploader: Arc<dyn HostUploader>,
    limits: SizeLimits,
}

impl OutputRouter {
    pub fn new(uploader: Arc<dyn HostUploader>, limits: SizeLimits) -> Self {
        Self { uploader, limits }
    }

    /// Effective rejection limit for a target.
    pub fn rejection_limit(&self, target: OutputTarget) -> u64 {
        let limit = target.size_policy(&self.limits).rejection_limit;
        match target {
            OutputTarget::InlineAttachment => limit,
            OutputTarget::HostedLink(_) => limit.min(self.uploader.max_upload_bytes()),
        }
    }

    /// Reject GIFs the target cannot take. Nothing is sent or uploaded.
    pub fn check_size(&self, gif: &EncodedGif, target: OutputTarget) -> ConversionResult<()> {
        let limit_bytes = self.rejection_limit(target);
        if gif.size_bytes <= limit_bytes {
            return Ok(());
        }
        let size_bytes = gif.size_bytes;
        Err(match target {
            OutputTarget::InlineAttachment => ConversionError::TooLargeForInline {
                size_bytes,
                limit_bytes,
            },
            OutputTarget::HostedLink(_) => ConversionError::TooLargeForHost {
                size_bytes,
                limit_bytes,
            },
        })
    }

    /// Deliver a size-checked GIF through `responder`.
    pub async fn deliver(
        &self,
        gif: &EncodedGif,
        target: OutputTarget,
        responder: &dyn Responder,
    ) -> ConversionResult<Delivery> {
        let note = if gif.outcome.is_truncated() {
            " (stopped early to stay under the size limit)"
        } else {
            ""
        };

        match target {
            OutputTarget::InlineAttachment => {
                responder
                    .send_file(&gif.path, ATTACHMENT_NAME, &format!("Here is your GIF{}.", note))
                    .await
                    .map_err(|e| ConversionError::unexpected(e.to_string()))?;
                info!(size_bytes = gif.size_bytes, "Delivered GIF as attachment");
                Ok(Delivery::Attachment {
                    size_bytes: gif.size_bytes,
                })
            }
            OutputTarget::HostedLink(expiry) => {
                let url = self.uploader.upload(&gif.path, expiry).await?;
                responder
                    .send_message(&format!(
                        "Here is your GIF{}, available for {}: {}",
                        note,
                        expiry.as_tag(),
                        url
                    ))
                    .await
                    .map_err(|e| ConversionError::unexpected(e.to_string()))?;
                info!(size_bytes = gif.size_bytes, url = %url, "Delivered GIF as hosted link");
                Ok(Delivery::Link { url, expiry })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeResponder, FakeUploader, Sent};
    use gifbot_media::RenderOutcome;
    use tempfile::TempDir;

    const MIB: u64 = 1024 * 1024;

    /// A sparse file of `size_bytes` standing in for a rendered GIF.
    fn gif(dir: &TempDir, size_bytes: u64) -> EncodedGif {
        let path = dir.path().join("req_0123456789abcdef_output.gif");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(size_bytes).unwrap();
        EncodedGif {
            path,
            size_bytes,
            outcome: RenderOutcome::Completed,
            diagnostic: String::new(),
        }
    }

    fn router(uploader: Arc<FakeUploader>) -> OutputRouter {
        OutputRouter::new(uploader, SizeLimits::default())
    }

    /// Same sequence the orchestrator runs.
    async fn route(
        router: &OutputRouter,
        gif: &EncodedGif,
        target: OutputTarget,
        responder: &FakeResponder,
    ) -> ConversionResult<Delivery> {
        router.check_size(gif, target)?;
        router.deliver(gif, target, responder).await
    }

    #[tokio::test]
    async fn test_inline_within_limit() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::ok("https://host/x.gif"));
        let responder = FakeResponder::default();
        let delivery = route(
            &router(uploader.clone()),
            &gif(&dir, 5 * MIB),
            OutputTarget::InlineAttachment,
            &responder,
        )
        .await
        .unwrap();

        assert_eq!(delivery, Delivery::Attachment { size_bytes: 5 * MIB });
        assert_eq!(uploader.calls(), 0);
        match responder.finals().as_slice() {
            [Sent::File { name, size_bytes, .. }] => {
                assert_eq!(name, ATTACHMENT_NAME);
                assert_eq!(*size_bytes, 5 * MIB);
            }
            other => panic!("unexpected deliveries {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inline_over_limit_never_uploads() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::ok("https://host/x.gif"));
        let responder = FakeResponder::default();
        let err = route(
            &router(uploader.clone()),
            &gif(&dir, 11 * MIB),
            OutputTarget::InlineAttachment,
            &responder,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::TooLargeForInline {
                size_bytes,
                limit_bytes
            } if size_bytes == 11 * MIB && limit_bytes == 10 * MIB
        ));
        assert_eq!(uploader.calls(), 0);
        assert!(responder.finals().is_empty());
    }

    #[tokio::test]
    async fn test_hosted_link() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::ok("https://host/x.gif"));
        let responder = FakeResponder::default();
        let delivery = route(
            &router(uploader.clone()),
            &gif(&dir, 50 * MIB),
            OutputTarget::HostedLink(HostExpiry::Medium),
            &responder,
        )
        .await
        .unwrap();

        assert_eq!(
            delivery,
            Delivery::Link {
                url: "https://host/x.gif".to_string(),
                expiry: HostExpiry::Medium
            }
        );
        assert_eq!(uploader.expiries(), vec![HostExpiry::Medium]);
        match responder.finals().as_slice() {
            [Sent::Message(text)] => assert!(text.contains("https://host/x.gif")),
            other => panic!("unexpected deliveries {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hosted_limit_uses_smaller_uploader_ceiling() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::ok("https://host/x.gif").with_max(20 * MIB));
        let responder = FakeResponder::default();
        let err = route(
            &router(uploader.clone()),
            &gif(&dir, 30 * MIB),
            OutputTarget::HostedLink(HostExpiry::Short),
            &responder,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ConversionError::TooLargeForHost { limit_bytes, .. } if limit_bytes == 20 * MIB
        ));
        assert_eq!(uploader.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::failing());
        let responder = FakeResponder::default();
        let err = route(
            &router(uploader),
            &gif(&dir, MIB),
            OutputTarget::HostedLink(HostExpiry::Long),
            &responder,
        )
        .await
        .unwrap_err();

        assert_eq!(err.class(), "host_upload_failed");
        assert!(responder.finals().is_empty());
    }

    #[tokio::test]
    async fn test_truncated_gif_is_flagged() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(FakeUploader::ok("https://host/x.gif"));
        let responder = FakeResponder::default();
        let mut truncated = gif(&dir, 9 * MIB);
        truncated.outcome = RenderOutcome::CompletedWithTruncation { exit_code: Some(1) };

        route(
            &router(uploader),
            &truncated,
            OutputTarget::InlineAttachment,
            &responder,
        )
        .await
        .unwrap();

        match responder.finals().as_slice() {
            [Sent::File { text, .. }] => assert!(text.contains("stopped early")),
            other => panic!("unexpected deliveries {:?}", other),
        }
    }
}
