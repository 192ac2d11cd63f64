//! Output-file resolution after a completed transfer
//!
//! Transfer results are adversarial: multi-file torrents routinely contain
//! sample clips and subtitle tracks next to the intended video. The resolver
//! degrades gracefully from "exact expected match" to "best guess" through an
//! ordered list of selection rules, and never returns a path that was not a
//! regular file at the moment of resolution.
//!
//! Rules, first non-empty result wins:
//! 1. normalized expected-name substring match (either containment direction)
//! 2. largest file among known video-container extensions
//! 3. first regular file of any type
//!
//! Candidates are only the direct children of the destination directory, in
//! the order the OS returns them.

use crate::error::{NotFoundError, Result};
use crate::types::{DownloadTask, ResolvedFile};
use std::path::PathBuf;
use tracing::{debug, info};

/// Known video-container extensions considered by the largest-video rule
const VIDEO_EXTENSIONS: [&str; 7] = ["mkv", "mp4", "avi", "mov", "wmv", "flv", "webm"];

/// A regular file directly under the destination directory
struct Candidate {
    name: String,
    path: PathBuf,
    size_bytes: u64,
}

/// One selection rule over the candidate list; returns the winning index
type SelectionRule = fn(&[Candidate], Option<&str>) -> Option<usize>;

/// Ordered selection policy
const RULES: [SelectionRule; 3] = [match_expected_name, largest_video, first_regular_file];

/// Select the single file that represents the task's result
///
/// Fails with a [`NotFoundError`] when the destination directory is absent,
/// empty, or contains no regular file that survives any rule.
pub async fn resolve_output(task: &DownloadTask) -> Result<ResolvedFile> {
    let dir = &task.destination_dir;
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Err(NotFoundError::MissingDirectory(dir.clone()).into());
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut seen_any = false;
    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        seen_any = true;
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        candidates.push(Candidate {
            name,
            path: entry.path(),
            size_bytes: metadata.len(),
        });
    }

    if !seen_any {
        return Err(NotFoundError::EmptyDirectory(dir.clone()).into());
    }

    debug!(
        destination = %dir.display(),
        candidates = candidates.len(),
        expected = task.expected_name.as_deref().unwrap_or("-"),
        "resolving transfer output"
    );

    let expected = task.expected_name.as_deref();
    for rule in RULES {
        if let Some(index) = rule(&candidates, expected) {
            let chosen = &candidates[index];
            info!(
                path = %chosen.path.display(),
                size_bytes = chosen.size_bytes,
                "resolved output file"
            );
            return Ok(ResolvedFile {
                path: chosen.path.clone(),
                size_bytes: chosen.size_bytes,
            });
        }
    }

    Err(NotFoundError::NoCandidate(dir.clone()).into())
}

/// Rule 1: normalized substring match against the expected name
fn match_expected_name(candidates: &[Candidate], expected: Option<&str>) -> Option<usize> {
    let expected = normalize_name(expected?);
    if expected.is_empty() {
        return None;
    }
    candidates.iter().position(|c| {
        let name = normalize_name(&c.name);
        !name.is_empty() && (name.contains(&expected) || expected.contains(&name))
    })
}

/// Rule 2: largest file carrying a known video-container extension,
/// ties broken by listing order
fn largest_video(candidates: &[Candidate], _expected: Option<&str>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        if !has_video_extension(&candidate.name) {
            continue;
        }
        match best {
            Some(current) if candidates[current].size_bytes >= candidate.size_bytes => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Rule 3: first regular file of any type
fn first_regular_file(candidates: &[Candidate], _expected: Option<&str>) -> Option<usize> {
    if candidates.is_empty() { None } else { Some(0) }
}

fn has_video_extension(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|v| ext.eq_ignore_ascii_case(v))
        })
}

/// Normalize a filename for comparison: strip the extension, turn `.`/`-`/`_`
/// into spaces, collapse repeated whitespace, case-fold
fn normalize_name(name: &str) -> String {
    let stem = std::path::Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    stem.replace(['.', '-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
