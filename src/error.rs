//! Error types for torrent-courier
//!
//! This module provides the error taxonomy for the pipeline:
//! - `NetworkError` — HTTP retrieval failures, surfaced to the caller, never retried here
//! - `TransferError` — engine-reported transfer failures, surfaced, not retried
//! - `NotFoundError` — no resolvable output file, a hard failure of the task
//! - `DeliveryError` — delivery failures, including the backend rate-limit
//!   condition the coordinator retries with multiplicative backoff
//!
//! Preview unavailability is deliberately absent: it is a logged degradation
//! (`PreviewResolver` returns `None`), not an error.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for torrent-courier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for torrent-courier
///
/// This is the primary error type used throughout the library. Each variant
/// includes contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP retrieval failed (descriptor or default-preview fetch)
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The transfer engine reported a failure
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// No resolvable output file after a completed transfer
    #[error("resolution error: {0}")]
    NotFound(#[from] NotFoundError),

    /// Delivery to the messaging backend failed
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// External tool invocation failed (frame extraction)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP retrieval errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request itself failed (connect, timeout, body read)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("unexpected HTTP status {status} fetching {url}")]
    Status {
        /// Response status code
        status: reqwest::StatusCode,
        /// The URL that was fetched
        url: String,
    },

    /// The URL carries no usable trailing path segment to derive a filename from
    #[error("no usable filename in URL: {0}")]
    NoFilename(String),
}

/// Transfer engine errors
#[derive(Debug, Error)]
pub enum TransferError {
    /// The engine failed before all referenced content was on disk
    #[error("engine failure: {0}")]
    Engine(String),
}

/// Output-file resolution errors
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// The destination directory does not exist
    #[error("destination directory does not exist: {0:?}")]
    MissingDirectory(PathBuf),

    /// The destination directory contains no entries at all
    #[error("destination directory is empty: {0:?}")]
    EmptyDirectory(PathBuf),

    /// Entries exist but none survived any selection rule
    #[error("no suitable file in destination directory: {0:?}")]
    NoCandidate(PathBuf),
}

/// Delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The backend imposed a rate limit carrying a required wait duration.
    ///
    /// The coordinator consumes this variant internally (backoff + retry);
    /// it only escapes to the caller when the retry bound is hit.
    #[error("backend rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait duration demanded by the backend
        retry_after: Duration,
    },

    /// The bounded rate-limit retry budget was exhausted
    #[error("rate-limit retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Number of send attempts made
        attempts: u32,
    },

    /// The upload was cancelled at a progress-callback boundary
    #[error("upload cancelled")]
    Cancelled,

    /// Generic backend failure
    #[error("backend failure: {0}")]
    Backend(String),
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = Error::from(NotFoundError::EmptyDirectory(PathBuf::from("/tmp/dl")));
        let msg = err.to_string();
        assert!(msg.contains("resolution error"));
        assert!(msg.contains("/tmp/dl"));
    }

    #[test]
    fn test_rate_limited_carries_wait() {
        let err = DeliveryError::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
