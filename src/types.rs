//! Core types and events for torrent-courier

use crate::utils::{format_bytes, format_duration};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Number of segments in the rendered progress bar
const PROGRESS_BAR_SEGMENTS: u32 = 12;

/// A reference to downloadable content handed to the transfer engine
///
/// `TorrentFile` descriptors are ephemeral: the driver deletes the file once
/// the engine has consumed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A magnet-style URI
    Magnet(String),
    /// A local torrent metadata file
    TorrentFile(PathBuf),
}

/// One acquisition task: where the transfer lands and what it is expected
/// to be called
///
/// Owned by the caller and passed into the driver and resolver; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Directory the transfer engine downloads into
    pub destination_dir: PathBuf,
    /// Optional expected name used to pick the output file out of a
    /// multi-file transfer result
    pub expected_name: Option<String>,
}

/// The single file selected to represent a completed transfer
///
/// Invariant: `path` exists and is a regular file at the moment of return,
/// or resolution fails instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute or task-relative path to the media file
    pub path: PathBuf,
    /// Size captured from filesystem metadata at resolution time
    pub size_bytes: u64,
}

/// Where a preview image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewOrigin {
    /// Operator-supplied file found under a conventional name; never deleted
    /// by this pipeline
    Existing,
    /// Extracted from the media file; deleted after use
    Generated,
    /// Fetched from the configured default URL; deleted after use
    Downloaded,
}

/// A usable preview image plus its deletion policy tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    /// Path to the image on disk
    pub path: PathBuf,
    /// Origin, which decides whether the coordinator deletes it after use
    pub origin: PreviewOrigin,
}

/// A point-in-time view of an in-flight upload
///
/// Recomputed on each report tick; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Bytes transmitted so far
    pub bytes_done: u64,
    /// Total bytes to transmit
    pub bytes_total: u64,
    /// Wall time since the send began
    pub elapsed: Duration,
    /// Human-readable label for the artifact (usually the filename)
    pub label: String,
    /// 1-based position of this artifact in its batch
    pub ordinal_index: u32,
    /// Batch size this artifact belongs to
    pub ordinal_count: u32,
}

impl ProgressSnapshot {
    /// Completion percentage in `0.0..=100.0`; zero when the total is unknown
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.bytes_total as f64 * 100.0
    }

    /// Average transmission speed in bytes per second since the send began
    pub fn speed_bps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / secs
    }

    /// Estimated time to completion; zero when speed is zero or undefined
    pub fn eta(&self) -> Duration {
        let speed = self.speed_bps();
        if speed <= 0.0 {
            return Duration::ZERO;
        }
        let remaining = self.bytes_total.saturating_sub(self.bytes_done) as f64;
        Duration::from_secs_f64(remaining / speed)
    }

    /// Human-readable `done of total` size text, e.g. `1.00 MiB of 3.00 MiB`
    pub fn size_text(&self) -> String {
        format!(
            "{} of {}",
            format_bytes(self.bytes_done as f64),
            format_bytes(self.bytes_total as f64)
        )
    }

    /// Human-readable average speed text, e.g. `102.40 KiB/s`
    pub fn speed_text(&self) -> String {
        format!("{}/s", format_bytes(self.speed_bps()))
    }

    /// Human-readable estimated time to completion
    pub fn eta_text(&self) -> String {
        format_duration(self.eta().as_secs())
    }

    /// A 12-segment textual progress bar, one segment per 8% of completion
    pub fn bar(&self) -> String {
        let filled = ((self.percent() / 8.0).floor() as u32).min(PROGRESS_BAR_SEGMENTS);
        let empty = PROGRESS_BAR_SEGMENTS - filled;
        let mut bar = String::with_capacity(PROGRESS_BAR_SEGMENTS as usize * 3);
        for _ in 0..filled {
            bar.push('█');
        }
        for _ in 0..empty {
            bar.push('▒');
        }
        bar
    }
}

/// Handle to a message the backend accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    /// Backend-assigned message identifier
    pub message_id: i64,
    /// Channel the message landed in
    pub channel: String,
}

/// Events emitted by the pipeline
///
/// Consumers subscribe via [`crate::TorrentCourier::subscribe`]. Send failures
/// on the broadcast channel are swallowed; events are observability, never
/// control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The transfer engine started on a descriptor
    TransferStarted {
        /// Destination directory
        destination_dir: PathBuf,
    },

    /// The transfer engine reported completion
    TransferComplete {
        /// Destination directory
        destination_dir: PathBuf,
    },

    /// The output file was resolved
    FileResolved {
        /// Selected path
        path: PathBuf,
        /// Size in bytes
        size_bytes: u64,
    },

    /// A preview image is ready
    PreviewReady {
        /// Path to the preview
        path: PathBuf,
        /// Where it came from
        origin: PreviewOrigin,
    },

    /// Every preview strategy failed; the upload proceeds without one
    PreviewUnavailable,

    /// Throttled upload progress report
    UploadProgress {
        /// Bytes transmitted so far
        bytes_done: u64,
        /// Total bytes to transmit
        bytes_total: u64,
        /// Completion percentage
        percent: f64,
        /// Average speed in bytes per second
        speed_bps: f64,
        /// Estimated seconds to completion (zero when speed is unknown)
        eta_secs: u64,
        /// Human-readable `done of total` size text
        size: String,
        /// Human-readable average speed text
        speed: String,
        /// Human-readable time-to-completion text
        eta: String,
        /// Rendered 12-segment bar
        bar: String,
        /// Artifact label
        label: String,
        /// 1-based position in the batch
        ordinal_index: u32,
        /// Batch size
        ordinal_count: u32,
    },

    /// The backend imposed a rate limit; the coordinator is backing off
    RateLimited {
        /// Seconds the coordinator will sleep before retrying
        wait_secs: u64,
        /// Send attempt number that was rate limited
        attempt: u32,
    },

    /// The artifact was delivered
    Delivered {
        /// Backend message handle
        handle: MessageHandle,
    },

    /// The upload failed (after cleanup ran)
    UploadFailed {
        /// Error message
        error: String,
    },

    /// A cleanup deletion failed; reported, never re-raised
    CleanupFailed {
        /// Path that could not be deleted
        path: PathBuf,
        /// Error message
        error: String,
    },

    /// Non-fatal degradation worth surfacing (corrupt preview removed,
    /// alternate extraction strategy used, and similar)
    Warning {
        /// Pipeline stage that emitted the warning
        scope: String,
        /// Warning message
        message: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(done: u64, total: u64, elapsed_secs: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_done: done,
            bytes_total: total,
            elapsed: Duration::from_secs(elapsed_secs),
            label: "Show.S01E01.mkv".to_string(),
            ordinal_index: 1,
            ordinal_count: 3,
        }
    }

    #[test]
    fn test_percent_basic() {
        assert_eq!(snapshot(50, 200, 1).percent(), 25.0);
        assert_eq!(snapshot(200, 200, 1).percent(), 100.0);
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(snapshot(10, 0, 1).percent(), 0.0);
    }

    #[test]
    fn test_speed_and_eta() {
        let s = snapshot(1000, 3000, 10);
        assert_eq!(s.speed_bps(), 100.0);
        assert_eq!(s.eta(), Duration::from_secs(20));
    }

    #[test]
    fn test_eta_zero_speed() {
        // No elapsed time means undefined speed; ETA must report zero
        let s = snapshot(0, 3000, 0);
        assert_eq!(s.speed_bps(), 0.0);
        assert_eq!(s.eta(), Duration::ZERO);
    }

    #[test]
    fn test_human_readable_progress_texts() {
        let s = snapshot(1024 * 1024, 3 * 1024 * 1024, 10);
        assert_eq!(s.size_text(), "1.00 MiB of 3.00 MiB");
        assert_eq!(s.speed_text(), "102.40 KiB/s");
        assert_eq!(s.eta_text(), "20s");
    }

    #[test]
    fn test_bar_segments() {
        assert_eq!(snapshot(0, 100, 1).bar(), "▒▒▒▒▒▒▒▒▒▒▒▒");
        assert_eq!(snapshot(100, 100, 1).bar(), "████████████");
        // 50% => floor(50 / 8) = 6 filled segments
        let bar = snapshot(50, 100, 1).bar();
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 6);
        assert_eq!(bar.chars().count(), 12);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = Event::PreviewReady {
            path: PathBuf::from("thumbs/x_thumb.jpg"),
            origin: PreviewOrigin::Generated,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"preview_ready\""));
        assert!(json.contains("\"generated\""));
    }
}
