//! Transfer engine capability
//!
//! The peer-to-peer engine is modeled as a capability interface rather than a
//! reimplementation target: the pipeline only ever calls
//! [`TransferEngine::start`], which returns once all referenced content is on
//! disk. Any conforming implementation can be substituted — the bundled
//! [`RqbitEngine`] for real transfers, or a test double.

mod rqbit;
mod traits;

pub use rqbit::RqbitEngine;
pub use traits::TransferEngine;
