//! Pipeline orchestration: one request in, one delivered artifact (or one
//! surfaced error) out
//!
//! Stages run strictly in order — descriptor fetch (when needed), transfer,
//! output resolution, preview resolution, delivery — and no stage begins
//! before the prior stage's postcondition holds. Each [`TorrentCourier::run`]
//! call is an independent unit of work: the courier is cheap to clone and
//! invocations share no mutable state beyond the injected engine and backend.

use crate::backend::MessagingBackend;
use crate::config::Config;
use crate::delivery::{DeliverOptions, DeliveryCoordinator};
use crate::engine::TransferEngine;
use crate::error::Result;
use crate::preview::{CliFrameExtractor, FrameExtractor, PreviewResolver};
use crate::resolver;
use crate::source::SourceFetcher;
use crate::transfer::TransferDriver;
use crate::types::{DownloadTask, Event, MessageHandle, SourceDescriptor};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Broadcast channel capacity for pipeline events
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Where one request's content comes from
#[derive(Debug, Clone)]
pub enum SourceRequest {
    /// A magnet-style URI handed straight to the engine
    Magnet(String),
    /// A direct-download link to a torrent descriptor file
    TorrentUrl(String),
    /// A torrent descriptor already on disk
    TorrentFile(PathBuf),
}

/// One acquisition-and-delivery request
#[derive(Debug, Clone)]
pub struct CourierRequest {
    /// Content source
    pub source: SourceRequest,
    /// Destination directory override; defaults to the configured
    /// download directory
    pub destination_dir: Option<PathBuf>,
    /// Expected name used to pick the output file out of a multi-file result
    pub expected_name: Option<String>,
    /// Label for captions and progress reports; defaults to the resolved
    /// file's name
    pub label: Option<String>,
    /// 1-based position of this artifact in its batch (default 1)
    pub ordinal_index: u32,
    /// Batch size this artifact belongs to (default 1)
    pub ordinal_count: u32,
    /// Per-request override of the configured document/video switch
    pub as_document: Option<bool>,
    /// Cooperative cancellation token for the delivery stage
    pub cancel: CancellationToken,
}

impl CourierRequest {
    /// Build a request for `source` with defaults for everything else
    pub fn new(source: SourceRequest) -> Self {
        Self {
            source,
            destination_dir: None,
            expected_name: None,
            label: None,
            ordinal_index: 1,
            ordinal_count: 1,
            as_document: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// The acquisition-and-delivery pipeline
///
/// Cloneable — all shared state is Arc-wrapped. Construct with a transfer
/// engine and a messaging backend; the frame extractor defaults to ffmpeg
/// discovered from PATH and can be overridden or removed.
#[derive(Clone)]
pub struct TorrentCourier {
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
    engine: Arc<dyn TransferEngine>,
    backend: Arc<dyn MessagingBackend>,
    extractor: Option<Arc<dyn FrameExtractor>>,
    fetcher: SourceFetcher,
}

impl TorrentCourier {
    /// Create a courier with the given capabilities
    pub fn new(
        config: Config,
        engine: Arc<dyn TransferEngine>,
        backend: Arc<dyn MessagingBackend>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let fetcher = SourceFetcher::new(config.descriptor_dir.clone());
        let extractor = CliFrameExtractor::from_path()
            .map(|e| Arc::new(e) as Arc<dyn FrameExtractor>);
        Self {
            config: Arc::new(config),
            event_tx,
            engine,
            backend,
            extractor,
            fetcher,
        }
    }

    /// Replace the frame extractor (or disable generation with `None`)
    pub fn with_frame_extractor(mut self, extractor: Option<Arc<dyn FrameExtractor>>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run one request end to end and return the backend message handle
    ///
    /// Exactly one of {successful delivery handle, surfaced error} occurs,
    /// and once delivery begins the media file is removed from disk exactly
    /// once on every exit path.
    pub async fn run(&self, request: CourierRequest) -> Result<MessageHandle> {
        let task = DownloadTask {
            destination_dir: request
                .destination_dir
                .clone()
                .unwrap_or_else(|| self.config.download_dir.clone()),
            expected_name: request.expected_name.clone(),
        };

        let descriptor = match &request.source {
            SourceRequest::Magnet(uri) => SourceDescriptor::Magnet(uri.clone()),
            SourceRequest::TorrentFile(path) => SourceDescriptor::TorrentFile(path.clone()),
            SourceRequest::TorrentUrl(url) => {
                debug!(url, "fetching descriptor for request");
                SourceDescriptor::TorrentFile(self.fetcher.fetch(url).await?)
            }
        };

        self.event_tx
            .send(Event::TransferStarted {
                destination_dir: task.destination_dir.clone(),
            })
            .ok();

        let driver = TransferDriver::new(self.engine.clone());
        driver.run(&descriptor, &task).await?;

        self.event_tx
            .send(Event::TransferComplete {
                destination_dir: task.destination_dir.clone(),
            })
            .ok();

        let media = resolver::resolve_output(&task).await?;
        self.event_tx
            .send(Event::FileResolved {
                path: media.path.clone(),
                size_bytes: media.size_bytes,
            })
            .ok();

        let previews = PreviewResolver::new(
            self.config.preview.clone(),
            self.extractor.clone(),
            self.event_tx.clone(),
        );
        let preview = previews.resolve(&media.path).await;

        let label = request.label.clone().unwrap_or_else(|| {
            media
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "artifact".to_string())
        });

        let options = DeliverOptions {
            label,
            ordinal_index: request.ordinal_index,
            ordinal_count: request.ordinal_count,
            as_document: request
                .as_document
                .unwrap_or(self.config.delivery.as_document),
            cancel: request.cancel.clone(),
        };

        let coordinator = DeliveryCoordinator::new(
            self.backend.clone(),
            self.config.delivery.clone(),
            self.event_tx.clone(),
        );
        let handle = coordinator
            .deliver(&media, preview.as_ref(), &options)
            .await?;

        info!(
            message_id = handle.message_id,
            channel = %handle.channel,
            "pipeline run complete"
        );
        Ok(handle)
    }
}
