//! Messaging backend capability
//!
//! The chat transport is modeled as a capability interface: the coordinator
//! only calls `send_document`/`send_video` and consumes the results. A real
//! backend drives the progress callback at its own cadence while the body is
//! in flight; a test double can drive it synthetically.
//!
//! Cancellation is cooperative: the callback's return value tells the backend
//! whether to carry on. A backend observing [`ProgressControl::Abort`] must
//! abort the in-flight transmission and fail the send with
//! [`crate::DeliveryError::Cancelled`].

use crate::error::Result;
use crate::types::MessageHandle;
use async_trait::async_trait;
use std::path::Path;

/// Decision returned from each progress-callback invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressControl {
    /// Keep transmitting
    Continue,
    /// Abort the in-flight transmission
    Abort,
}

/// Callback the backend invokes with `(bytes_done, bytes_total)` at its own
/// cadence during a send
pub type ProgressCallback = Box<dyn FnMut(u64, u64) -> ProgressControl + Send>;

/// One send request: the artifact, its optional preview, and the caption
#[derive(Debug)]
pub struct SendRequest<'a> {
    /// Destination channel
    pub channel: &'a str,
    /// Media file to transmit
    pub file: &'a Path,
    /// Optional preview image to attach
    pub preview: Option<&'a Path>,
    /// Caption for the message
    pub caption: &'a str,
}

/// External component that delivers a file to a channel and reports
/// transmission progress
///
/// Rate limiting is signaled by failing the send with
/// [`crate::DeliveryError::RateLimited`] carrying the demanded wait; the
/// coordinator handles backoff and retry.
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Implementation name for logging
    fn name(&self) -> &'static str;

    /// Send the file as a generic document attachment
    async fn send_document(
        &self,
        request: SendRequest<'_>,
        progress: ProgressCallback,
    ) -> Result<MessageHandle>;

    /// Send the file as a playable video attachment
    async fn send_video(
        &self,
        request: SendRequest<'_>,
        progress: ProgressCallback,
    ) -> Result<MessageHandle>;
}
