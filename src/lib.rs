//! # torrent-courier
//!
//! Acquisition-and-delivery pipeline for media content: resolve a torrent,
//! magnet, or direct-download source into exactly one local file, prepare a
//! preview image for it, and deliver file plus preview to a messaging backend
//! with rate-limit backoff, throttled progress reporting, and guaranteed
//! cleanup.
//!
//! ## Design Philosophy
//!
//! torrent-courier is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Capability-based** - The transfer engine, messaging backend, and frame
//!   extractor are traits; real implementations and test doubles substitute
//!   freely
//! - **Deterministic about cleanup** - Once delivery begins, the media file
//!   leaves the disk exactly once on every exit path
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use torrent_courier::{
//!     Config, CourierRequest, RqbitEngine, SourceRequest, TorrentCourier,
//! };
//! # use torrent_courier::MessagingBackend;
//! # fn make_backend() -> Arc<dyn MessagingBackend> { unimplemented!() }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         delivery: torrent_courier::DeliveryConfig {
//!             channel: "releases".to_string(),
//!             ..Default::default()
//!         },
//!         ..Default::default()
//!     };
//!
//!     let backend = make_backend();
//!     let courier = TorrentCourier::new(config, Arc::new(RqbitEngine::new()), backend);
//!
//!     // Subscribe to events
//!     let mut events = courier.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = CourierRequest::new(SourceRequest::Magnet(
//!         "magnet:?xt=urn:btih:...".to_string(),
//!     ));
//!     let handle = courier.run(request).await?;
//!     println!("delivered as message {}", handle.message_id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Messaging backend capability
pub mod backend;
/// Configuration types
pub mod config;
/// Delivery coordination (backoff, progress, cleanup)
pub mod delivery;
/// Transfer engine capability and the rqbit implementation
pub mod engine;
/// Error types
pub mod error;
/// Pipeline orchestration
pub mod pipeline;
/// Preview-image resolution
pub mod preview;
/// Output-file resolution
pub mod resolver;
/// Descriptor retrieval
pub mod source;
/// Transfer driver
pub mod transfer;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use backend::{MessagingBackend, ProgressCallback, ProgressControl, SendRequest};
pub use config::{Config, DeliveryConfig, PreviewConfig, RateLimitConfig};
pub use delivery::{DeliverOptions, DeliveryCoordinator};
pub use engine::{RqbitEngine, TransferEngine};
pub use error::{
    DeliveryError, Error, NetworkError, NotFoundError, Result, TransferError,
};
pub use pipeline::{CourierRequest, SourceRequest, TorrentCourier};
pub use preview::{CliFrameExtractor, ExtractSpec, FrameExtractor, PreviewResolver};
pub use source::SourceFetcher;
pub use transfer::TransferDriver;
pub use types::{
    DownloadTask, Event, MessageHandle, PreviewImage, PreviewOrigin, ProgressSnapshot,
    ResolvedFile, SourceDescriptor,
};
