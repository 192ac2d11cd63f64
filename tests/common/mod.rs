//! Shared test doubles and helpers for integration tests

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use torrent_courier::{
    Config, DeliveryConfig, MessageHandle, MessagingBackend, PreviewConfig, ProgressCallback,
    ProgressControl, Result, SendRequest, SourceDescriptor, TorrentCourier, TransferEngine,
    TransferError,
};

/// Engine double that materializes a scripted set of files in the
/// destination directory instead of talking to any swarm
pub struct MockTransferEngine {
    /// `(filename, size)` pairs written on each start
    pub files: Vec<(&'static str, usize)>,
    /// Fail instead of writing anything
    pub fail: bool,
    /// Number of starts observed
    pub starts: AtomicU32,
}

impl MockTransferEngine {
    pub fn producing(files: Vec<(&'static str, usize)>) -> Arc<Self> {
        Arc::new(Self {
            files,
            fail: false,
            starts: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            files: Vec::new(),
            fail: true,
            starts: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TransferEngine for MockTransferEngine {
    fn name(&self) -> &'static str {
        "mock-engine"
    }

    async fn start(&self, _descriptor: &SourceDescriptor, destination_dir: &Path) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransferError::Engine("no peers".into()).into());
        }
        tokio::fs::create_dir_all(destination_dir).await?;
        for (name, size) in &self.files {
            tokio::fs::write(destination_dir.join(name), vec![0u8; *size]).await?;
        }
        Ok(())
    }
}

/// One send the recording backend observed
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub channel: String,
    pub file: PathBuf,
    pub preview: Option<PathBuf>,
    pub caption: String,
    pub as_document: bool,
}

/// Backend double that records sends, drives the progress callback to
/// completion, and returns sequential message handles
pub struct RecordingBackend {
    pub sends: Mutex<Vec<RecordedSend>>,
    next_id: AtomicU32,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sends: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        })
    }

    fn record(
        &self,
        request: SendRequest<'_>,
        as_document: bool,
        mut progress: ProgressCallback,
    ) -> Result<MessageHandle> {
        let total = std::fs::metadata(request.file).map(|m| m.len()).unwrap_or(0);
        for done in [total / 2, total] {
            if progress(done, total) == ProgressControl::Abort {
                return Err(torrent_courier::DeliveryError::Cancelled.into());
            }
        }
        self.sends.lock().unwrap().push(RecordedSend {
            channel: request.channel.to_string(),
            file: request.file.to_path_buf(),
            preview: request.preview.map(Path::to_path_buf),
            caption: request.caption.to_string(),
            as_document,
        });
        Ok(MessageHandle {
            message_id: i64::from(self.next_id.fetch_add(1, Ordering::SeqCst)),
            channel: request.channel.to_string(),
        })
    }
}

#[async_trait]
impl MessagingBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording-backend"
    }

    async fn send_document(
        &self,
        request: SendRequest<'_>,
        progress: ProgressCallback,
    ) -> Result<MessageHandle> {
        self.record(request, true, progress)
    }

    async fn send_video(
        &self,
        request: SendRequest<'_>,
        progress: ProgressCallback,
    ) -> Result<MessageHandle> {
        self.record(request, false, progress)
    }
}

/// Build a courier wired to the given doubles, rooted in a temp dir.
/// Returns the courier and the tempdir (which must be kept alive).
pub fn create_test_courier(
    engine: Arc<MockTransferEngine>,
    backend: Arc<RecordingBackend>,
) -> (TorrentCourier, TempDir) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = Config {
        download_dir: temp_dir.path().join("downloads"),
        descriptor_dir: temp_dir.path().join("torrents"),
        preview: PreviewConfig {
            staging_dir: temp_dir.path().join("thumbs"),
            lookup_dir: temp_dir.path().join("lookup"),
            default_url: None,
        },
        delivery: DeliveryConfig {
            channel: "releases".to_string(),
            ..Default::default()
        },
    };
    std::fs::create_dir_all(temp_dir.path().join("lookup")).expect("create lookup dir");

    // No frame extractor: integration runs exercise the no-preview path
    // unless a test plants an operator thumbnail in the lookup dir
    let courier = TorrentCourier::new(config, engine, backend).with_frame_extractor(None);
    (courier, temp_dir)
}
