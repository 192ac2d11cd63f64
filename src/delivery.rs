//! Delivery stage: send the artifact, survive rate limits, report progress,
//! always clean up
//!
//! The coordinator owns three guarantees the rest of the pipeline depends on:
//!
//! - **Bounded rate-limit backoff** — a backend-imposed wait `d` is honored
//!   as `multiplier × d` (1.5 by default) before the whole send is retried
//!   from the top, up to a configured retry budget.
//! - **Throttled progress** — outward reports fire at most once per interval
//!   of wall time, except the final callback which always reports. Report
//!   transmission failures are swallowed; they never abort the transfer.
//! - **Guaranteed cleanup** — the media file is deleted on every exit path
//!   (success, error, cancellation), and the preview too unless it is
//!   operator-supplied. Cleanup errors are reported, never re-raised over
//!   the original outcome.

use crate::backend::{MessagingBackend, ProgressCallback, ProgressControl, SendRequest};
use crate::config::DeliveryConfig;
use crate::error::{DeliveryError, Error, Result};
use crate::types::{Event, MessageHandle, PreviewImage, PreviewOrigin, ProgressSnapshot, ResolvedFile};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Per-artifact delivery options
#[derive(Debug, Clone)]
pub struct DeliverOptions {
    /// Human-readable label; also used as the caption
    pub label: String,
    /// 1-based position of this artifact in its batch
    pub ordinal_index: u32,
    /// Batch size this artifact belongs to
    pub ordinal_count: u32,
    /// Send as a generic document instead of a playable video
    pub as_document: bool,
    /// Cooperative cancellation token, polled at each progress callback
    pub cancel: CancellationToken,
}

/// Sends a resolved file plus preview to the messaging backend
pub struct DeliveryCoordinator {
    backend: Arc<dyn MessagingBackend>,
    config: DeliveryConfig,
    event_tx: broadcast::Sender<Event>,
}

impl DeliveryCoordinator {
    /// Create a coordinator on top of `backend`
    pub fn new(
        backend: Arc<dyn MessagingBackend>,
        config: DeliveryConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            backend,
            config,
            event_tx,
        }
    }

    /// Deliver `media` (with `preview`, if any) to the configured channel
    ///
    /// Whatever the outcome, the media file is removed from disk exactly once
    /// before this returns, and the preview as well unless its origin is
    /// [`PreviewOrigin::Existing`].
    pub async fn deliver(
        &self,
        media: &ResolvedFile,
        preview: Option<&PreviewImage>,
        options: &DeliverOptions,
    ) -> Result<MessageHandle> {
        let outcome = self.send_with_backoff(media, preview, options).await;

        // Single cleanup site, reached on success, error, and cancellation alike
        self.cleanup(&media.path, preview).await;

        match &outcome {
            Ok(handle) => {
                info!(
                    channel = %handle.channel,
                    message_id = handle.message_id,
                    label = %options.label,
                    "artifact delivered"
                );
                self.event_tx
                    .send(Event::Delivered {
                        handle: handle.clone(),
                    })
                    .ok();
            }
            Err(e) => {
                error!(label = %options.label, error = %e, "upload failed");
                self.event_tx
                    .send(Event::UploadFailed {
                        error: e.to_string(),
                    })
                    .ok();
            }
        }

        outcome
    }

    /// Retry the whole send on rate limits, up to the configured budget
    async fn send_with_backoff(
        &self,
        media: &ResolvedFile,
        preview: Option<&PreviewImage>,
        options: &DeliverOptions,
    ) -> Result<MessageHandle> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            if options.cancel.is_cancelled() {
                return Err(DeliveryError::Cancelled.into());
            }

            debug!(
                backend = self.backend.name(),
                attempt,
                label = %options.label,
                as_document = options.as_document,
                "sending artifact"
            );

            let request = SendRequest {
                channel: &self.config.channel,
                file: &media.path,
                preview: preview.map(|p| p.path.as_path()),
                caption: &options.label,
            };
            let progress = self.progress_callback(options, started);

            let result = if options.as_document {
                self.backend.send_document(request, progress).await
            } else {
                self.backend.send_video(request, progress).await
            };

            match result {
                Ok(handle) => return Ok(handle),
                Err(Error::Delivery(DeliveryError::RateLimited { retry_after })) => {
                    if attempt > self.config.rate_limit.max_retries {
                        return Err(DeliveryError::RetriesExhausted { attempts: attempt }.into());
                    }
                    let wait = retry_after.mul_f64(self.config.rate_limit.backoff_multiplier);
                    warn!(
                        wait_secs = wait.as_secs(),
                        attempt, "backend rate limited, backing off"
                    );
                    self.event_tx
                        .send(Event::RateLimited {
                            wait_secs: wait.as_secs(),
                            attempt,
                        })
                        .ok();
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Build the throttled, cancellation-aware progress callback
    ///
    /// The throttle window opens when the send begins, so the first report
    /// fires no earlier than one interval in; the final callback
    /// (`bytes_done == bytes_total`) always reports.
    fn progress_callback(&self, options: &DeliverOptions, started: Instant) -> ProgressCallback {
        let event_tx = self.event_tx.clone();
        let cancel = options.cancel.clone();
        let interval = self.config.progress_interval;
        let label = options.label.clone();
        let ordinal_index = options.ordinal_index;
        let ordinal_count = options.ordinal_count;
        let mut last_report = Instant::now();

        Box::new(move |bytes_done, bytes_total| {
            if cancel.is_cancelled() {
                return ProgressControl::Abort;
            }

            let now = Instant::now();
            let due = now.duration_since(last_report) >= interval;
            let is_final = bytes_done == bytes_total;
            if due || is_final {
                last_report = now;
                let snapshot = ProgressSnapshot {
                    bytes_done,
                    bytes_total,
                    elapsed: started.elapsed(),
                    label: label.clone(),
                    ordinal_index,
                    ordinal_count,
                };
                // Report failures must never abort the transfer
                event_tx
                    .send(Event::UploadProgress {
                        bytes_done,
                        bytes_total,
                        percent: snapshot.percent(),
                        speed_bps: snapshot.speed_bps(),
                        eta_secs: snapshot.eta().as_secs(),
                        size: snapshot.size_text(),
                        speed: snapshot.speed_text(),
                        eta: snapshot.eta_text(),
                        bar: snapshot.bar(),
                        label: snapshot.label,
                        ordinal_index,
                        ordinal_count,
                    })
                    .ok();
            }

            ProgressControl::Continue
        })
    }

    /// Delete the media file and any non-operator preview; errors are
    /// reported but never override the delivery outcome
    async fn cleanup(&self, media_path: &Path, preview: Option<&PreviewImage>) {
        if let Err(e) = tokio::fs::remove_file(media_path).await {
            warn!(path = %media_path.display(), error = %e, "media cleanup failed");
            self.event_tx
                .send(Event::CleanupFailed {
                    path: media_path.to_path_buf(),
                    error: e.to_string(),
                })
                .ok();
        }

        if let Some(preview) = preview
            && preview.origin != PreviewOrigin::Existing
            && let Err(e) = tokio::fs::remove_file(&preview.path).await
        {
            warn!(path = %preview.path.display(), error = %e, "preview cleanup failed");
            self.event_tx
                .send(Event::CleanupFailed {
                    path: preview.path.clone(),
                    error: e.to_string(),
                })
                .ok();
        }
    }
}
