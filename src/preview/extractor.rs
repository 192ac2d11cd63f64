//! CLI-based frame extraction using an external ffmpeg binary

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Parameters for a single-frame extraction run
#[derive(Debug, Clone)]
pub struct ExtractSpec {
    /// Seek offset handed to the tool (e.g. `00:01:00` or `30`)
    pub seek: String,
    /// Video filter expression (scale/pad spec)
    pub video_filter: String,
    /// Optional quality level (`-q:v`)
    pub quality: Option<u32>,
    /// Output image path
    pub output: PathBuf,
}

/// Trait for still-frame extraction from a media file
///
/// Implementations can shell out to an external tool or serve as test
/// doubles. Success means the tool exited zero; callers additionally check
/// that the output file is non-empty before accepting it.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Implementation name for logging
    fn name(&self) -> &'static str;

    /// Extract exactly one frame from `input` according to `spec`
    async fn extract(&self, input: &Path, spec: &ExtractSpec) -> Result<()>;
}

/// [`FrameExtractor`] implementation shelling out to ffmpeg
///
/// # Examples
///
/// ```no_run
/// use torrent_courier::preview::CliFrameExtractor;
///
/// // Auto-discover ffmpeg from PATH
/// let extractor = CliFrameExtractor::from_path().expect("ffmpeg not found");
/// ```
pub struct CliFrameExtractor {
    binary_path: PathBuf,
}

impl CliFrameExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    ///
    /// Returns `None` when the binary is absent; the preview chain then skips
    /// the generation strategies.
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }
}

#[async_trait]
impl FrameExtractor for CliFrameExtractor {
    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }

    async fn extract(&self, input: &Path, spec: &ExtractSpec) -> Result<()> {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(&spec.seek)
            .arg("-vframes")
            .arg("1")
            .arg("-vf")
            .arg(&spec.video_filter);
        if let Some(quality) = spec.quality {
            command.arg("-q:v").arg(quality.to_string());
        }
        command.arg("-y").arg(&spec.output);

        let output = command
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            // Diagnostic stream goes to logs only
            debug!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "ffmpeg frame extraction failed"
            );
            return Err(Error::ExternalTool(format!(
                "ffmpeg exited with status {:?}",
                output.status.code()
            )));
        }

        Ok(())
    }
}
