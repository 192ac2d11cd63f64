//! Preview-image resolution with graceful degradation
//!
//! A preview is nice to have, never load-bearing: the resolver walks an
//! ordered strategy chain and returns `None` when everything fails, letting
//! the delivery proceed without one. Strategies, short-circuiting on first
//! success:
//!
//! 1. reuse an operator-supplied preview under a conventional filename
//! 2. extract a frame from the media file (primary spec: one-minute offset,
//!    320×240 letterboxed)
//! 3. extract with an alternate spec (30-second offset, plain scaling) to
//!    recover from sources too short for the primary offset
//! 4. stream-fetch a configured default preview URL
//!
//! Origins are tagged so the delivery stage knows what it may delete:
//! operator-supplied previews are never touched, generated and downloaded
//! ones are removed after use.

mod extractor;

pub use extractor::{CliFrameExtractor, ExtractSpec, FrameExtractor};

use crate::config::PreviewConfig;
use crate::types::{Event, PreviewImage, PreviewOrigin};
use crate::utils::download_to_file;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Conventional operator-supplied preview filenames, checked in order
const EXISTING_CANDIDATES: [&str; 4] = ["thumb.jpg", "thumb.png", "thumbnail.jpg", "thumbnail.png"];

/// Primary extraction: a frame from one minute in, letterboxed to 320×240
const PRIMARY_SEEK: &str = "00:01:00";
const PRIMARY_FILTER: &str =
    "scale=320:240:force_original_aspect_ratio=decrease,pad=320:240:(ow-iw)/2:(oh-ih)/2";

/// Alternate extraction for sources too short for the primary offset
const ALTERNATE_SEEK: &str = "30";
const ALTERNATE_FILTER: &str = "scale=320:240";
const ALTERNATE_QUALITY: u32 = 2;

/// Fixed filename for the downloaded default preview
const DEFAULT_PREVIEW_NAME: &str = "thumb_default.jpg";

/// Resolves a usable preview image for a media file
pub struct PreviewResolver {
    config: PreviewConfig,
    extractor: Option<Arc<dyn FrameExtractor>>,
    client: reqwest::Client,
    event_tx: broadcast::Sender<Event>,
}

impl PreviewResolver {
    /// Create a resolver; `extractor` is `None` when no extraction tool is
    /// available, which skips the generation strategies
    pub fn new(
        config: PreviewConfig,
        extractor: Option<Arc<dyn FrameExtractor>>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            config,
            extractor,
            client: reqwest::Client::new(),
            event_tx,
        }
    }

    /// Produce a preview for `media_path`, or `None` when every strategy fails
    ///
    /// Never errors; absence is a valid, logged outcome.
    pub async fn resolve(&self, media_path: &Path) -> Option<PreviewImage> {
        let preview = if let Some(path) = self.existing().await {
            PreviewImage {
                path,
                origin: PreviewOrigin::Existing,
            }
        } else if let Some(path) = self.generated(media_path).await {
            PreviewImage {
                path,
                origin: PreviewOrigin::Generated,
            }
        } else if let Some(path) = self.downloaded_default().await {
            PreviewImage {
                path,
                origin: PreviewOrigin::Downloaded,
            }
        } else {
            warn!(media = %media_path.display(), "no preview available, proceeding without one");
            self.event_tx.send(Event::PreviewUnavailable).ok();
            return None;
        };

        info!(
            path = %preview.path.display(),
            origin = ?preview.origin,
            "preview resolved"
        );
        self.event_tx
            .send(Event::PreviewReady {
                path: preview.path.clone(),
                origin: preview.origin,
            })
            .ok();
        Some(preview)
    }

    /// Strategy 1: operator-supplied preview under a conventional name
    ///
    /// Zero-size candidates are deleted opportunistically (corruption cleanup).
    async fn existing(&self) -> Option<PathBuf> {
        for name in EXISTING_CANDIDATES {
            let path = self.config.lookup_dir.join(name);
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            if metadata.len() == 0 {
                warn!(path = %path.display(), "removing zero-size preview");
                self.event_tx
                    .send(Event::Warning {
                        scope: "preview".to_string(),
                        message: format!("removed corrupt preview {}", path.display()),
                    })
                    .ok();
                tokio::fs::remove_file(&path).await.ok();
                continue;
            }
            debug!(path = %path.display(), size = metadata.len(), "using existing preview");
            return Some(path);
        }
        None
    }

    /// Strategies 2 and 3: frame extraction, primary spec then alternate
    async fn generated(&self, media_path: &Path) -> Option<PathBuf> {
        let extractor = self.extractor.as_ref()?;
        let base = media_path.file_stem()?.to_str()?;

        if tokio::fs::create_dir_all(&self.config.staging_dir)
            .await
            .is_err()
        {
            warn!(staging = %self.config.staging_dir.display(), "cannot create preview staging dir");
            return None;
        }

        let primary = ExtractSpec {
            seek: PRIMARY_SEEK.to_string(),
            video_filter: PRIMARY_FILTER.to_string(),
            quality: None,
            output: self.config.staging_dir.join(format!("{}_thumb.jpg", base)),
        };
        if let Some(path) = self.attempt(extractor.as_ref(), media_path, &primary).await {
            return Some(path);
        }

        self.event_tx
            .send(Event::Warning {
                scope: "preview".to_string(),
                message: "primary frame extraction failed, trying alternate offset".to_string(),
            })
            .ok();

        let alternate = ExtractSpec {
            seek: ALTERNATE_SEEK.to_string(),
            video_filter: ALTERNATE_FILTER.to_string(),
            quality: Some(ALTERNATE_QUALITY),
            output: self
                .config
                .staging_dir
                .join(format!("{}_thumb_alt.jpg", base)),
        };
        self.attempt(extractor.as_ref(), media_path, &alternate)
            .await
    }

    /// One extraction attempt; accepts only a zero exit and a non-empty output
    async fn attempt(
        &self,
        extractor: &dyn FrameExtractor,
        media_path: &Path,
        spec: &ExtractSpec,
    ) -> Option<PathBuf> {
        debug!(
            extractor = extractor.name(),
            media = %media_path.display(),
            seek = %spec.seek,
            output = %spec.output.display(),
            "extracting preview frame"
        );
        if let Err(e) = extractor.extract(media_path, spec).await {
            debug!(error = %e, "frame extraction attempt failed");
            return None;
        }
        match tokio::fs::metadata(&spec.output).await {
            Ok(metadata) if metadata.len() > 0 => Some(spec.output.clone()),
            _ => {
                debug!(output = %spec.output.display(), "extractor produced no usable output");
                None
            }
        }
    }

    /// Strategy 4: stream-fetch the configured default preview
    async fn downloaded_default(&self) -> Option<PathBuf> {
        let url = self.config.default_url.as_deref()?;
        let path = self.config.staging_dir.join(DEFAULT_PREVIEW_NAME);

        if tokio::fs::create_dir_all(&self.config.staging_dir)
            .await
            .is_err()
        {
            return None;
        }

        match download_to_file(&self.client, url, &path).await {
            Ok(()) => {
                let metadata = tokio::fs::metadata(&path).await.ok()?;
                if metadata.len() > 0 {
                    debug!(path = %path.display(), "downloaded default preview");
                    Some(path)
                } else {
                    warn!("downloaded default preview is empty");
                    tokio::fs::remove_file(&path).await.ok();
                    None
                }
            }
            Err(e) => {
                warn!(url, error = %e, "default preview download failed");
                None
            }
        }
    }
}
