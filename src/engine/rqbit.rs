//! rqbit-backed transfer engine

use super::traits::TransferEngine;
use crate::error::{Result, TransferError};
use crate::types::SourceDescriptor;
use async_trait::async_trait;
use librqbit::{AddTorrent, Session};
use std::path::Path;
use tracing::{debug, info};

/// [`TransferEngine`] implementation on the embedded rqbit client
///
/// Each call spins up a session rooted at the destination directory, adds the
/// torrent, waits for completion, and tears the session down. Sessions are
/// per-call so concurrent pipeline invocations stay independent.
pub struct RqbitEngine;

impl RqbitEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }
}

impl Default for RqbitEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransferEngine for RqbitEngine {
    fn name(&self) -> &'static str {
        "rqbit"
    }

    async fn start(&self, descriptor: &SourceDescriptor, destination_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(destination_dir).await?;

        let session = Session::new(destination_dir.to_path_buf())
            .await
            .map_err(|e| TransferError::Engine(format!("create session: {e:#}")))?;

        let add = match descriptor {
            SourceDescriptor::Magnet(uri) => {
                debug!(uri, "adding magnet");
                AddTorrent::from_url(uri)
            }
            SourceDescriptor::TorrentFile(path) => {
                debug!(descriptor = %path.display(), "adding torrent file");
                let bytes = tokio::fs::read(path).await?;
                AddTorrent::from_bytes(bytes)
            }
        };

        let response = session
            .add_torrent(add, None)
            .await
            .map_err(|e| TransferError::Engine(format!("add torrent: {e:#}")))?;

        let handle = response
            .into_handle()
            .ok_or_else(|| TransferError::Engine("torrent was not managed by session".into()))?;

        handle
            .wait_until_completed()
            .await
            .map_err(|e| TransferError::Engine(format!("wait for completion: {e:#}")))?;

        session.stop().await;
        info!(destination = %destination_dir.display(), "transfer complete");
        Ok(())
    }
}
