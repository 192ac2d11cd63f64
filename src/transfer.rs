//! Transfer driver: thin control wrapper around the transfer engine
//!
//! The driver hands a descriptor to the engine, suspends until the engine
//! reports completion, and disposes of a local descriptor file afterwards.
//! It deliberately never inspects the resulting files: an engine may
//! materialize a directory tree, a single file, or several candidates
//! (subtitles, samples, the intended video), and that selection policy lives
//! in [`crate::resolver`] where it is independently testable.

use crate::engine::TransferEngine;
use crate::error::Result;
use crate::types::{DownloadTask, SourceDescriptor};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives one transfer to completion through the engine
#[derive(Clone)]
pub struct TransferDriver {
    engine: Arc<dyn TransferEngine>,
}

impl TransferDriver {
    /// Create a driver on top of `engine`
    pub fn new(engine: Arc<dyn TransferEngine>) -> Self {
        Self { engine }
    }

    /// Download everything `descriptor` references into the task's
    /// destination directory, then delete the descriptor file if it was local
    pub async fn run(&self, descriptor: &SourceDescriptor, task: &DownloadTask) -> Result<()> {
        debug!(
            engine = self.engine.name(),
            destination = %task.destination_dir.display(),
            "starting transfer"
        );

        self.engine
            .start(descriptor, &task.destination_dir)
            .await?;

        if let SourceDescriptor::TorrentFile(path) = descriptor {
            // The descriptor is ephemeral; its job ends with the transfer
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(descriptor = %path.display(), error = %e, "failed to remove descriptor");
            }
        }

        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransferError};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine double that writes a marker file and counts invocations
    struct WritingEngine {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TransferEngine for WritingEngine {
        fn name(&self) -> &'static str {
            "writing-test-engine"
        }

        async fn start(
            &self,
            _descriptor: &SourceDescriptor,
            destination_dir: &Path,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransferError::Engine("tracker unreachable".into()).into());
            }
            tokio::fs::create_dir_all(destination_dir).await?;
            tokio::fs::write(destination_dir.join("payload.mkv"), b"video").await?;
            Ok(())
        }
    }

    fn task(dir: &Path) -> DownloadTask {
        DownloadTask {
            destination_dir: dir.to_path_buf(),
            expected_name: None,
        }
    }

    #[tokio::test]
    async fn test_run_deletes_local_descriptor_on_completion() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor_path = dir.path().join("ep01.torrent");
        std::fs::write(&descriptor_path, b"meta").unwrap();

        let driver = TransferDriver::new(Arc::new(WritingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        }));
        let descriptor = SourceDescriptor::TorrentFile(descriptor_path.clone());

        driver
            .run(&descriptor, &task(&dir.path().join("out")))
            .await
            .unwrap();
        assert!(!descriptor_path.exists());
    }

    #[tokio::test]
    async fn test_run_keeps_descriptor_on_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor_path = dir.path().join("ep01.torrent");
        std::fs::write(&descriptor_path, b"meta").unwrap();

        let driver = TransferDriver::new(Arc::new(WritingEngine {
            calls: AtomicUsize::new(0),
            fail: true,
        }));
        let descriptor = SourceDescriptor::TorrentFile(descriptor_path.clone());

        let err = driver
            .run(&descriptor, &task(&dir.path().join("out")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transfer(_)));
        // Failure surfaces before the descriptor is consumed
        assert!(descriptor_path.exists());
    }

    #[tokio::test]
    async fn test_run_magnet_has_nothing_to_delete() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(WritingEngine {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let driver = TransferDriver::new(engine.clone());
        let descriptor = SourceDescriptor::Magnet("magnet:?xt=urn:btih:abc".into());

        driver
            .run(&descriptor, &task(&dir.path().join("out")))
            .await
            .unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("out/payload.mkv").exists());
    }
}
