//! Trait for the external transfer engine

use crate::error::Result;
use crate::types::SourceDescriptor;
use async_trait::async_trait;
use std::path::Path;

/// External component that executes a peer-to-peer download
///
/// The contract is deliberately thin: `start` suspends until every file the
/// descriptor references is on disk under `destination_dir`, or errors. No
/// partial-progress reporting is assumed, and the engine never tells the
/// caller which of the materialized files is the interesting one — that
/// selection belongs to the resolver.
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Implementation name for logging
    fn name(&self) -> &'static str;

    /// Download all content described by `descriptor` into `destination_dir`,
    /// returning only on completion
    async fn start(&self, descriptor: &SourceDescriptor, destination_dir: &Path) -> Result<()>;
}
