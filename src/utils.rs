//! Utility functions for formatting, URL handling, and streamed downloads

use crate::error::{NetworkError, Result};
use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Format a byte count as a human-readable size
///
/// # Examples
///
/// ```
/// use torrent_courier::utils::format_bytes;
///
/// assert_eq!(format_bytes(512.0), "512 B");
/// assert_eq!(format_bytes(1536.0), "1.50 KiB");
/// ```
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if !bytes.is_finite() || bytes < 0.0 {
        return "0 B".to_string();
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", value as u64, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Format a number of seconds as a compact `1h 2m 3s` style duration
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Derive a local filename from a URL's trailing path segment
///
/// Query strings and fragments are ignored. Fails when the URL cannot be
/// parsed or its path carries no non-empty final segment.
pub fn filename_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)
        .map_err(|_| NetworkError::NoFilename(url.to_string()))?;

    let name = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string)
        .ok_or_else(|| NetworkError::NoFilename(url.to_string()))?;

    Ok(name)
}

/// Stream the HTTP body at `url` into `path`
///
/// A non-success status fails with [`NetworkError::Status`] before anything
/// is written. A mid-stream failure removes the partial file before the
/// error surfaces, so `path` either holds the complete body or is absent.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<()> {
    let response = client.get(url).send().await.map_err(NetworkError::from)?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::Status {
            status,
            url: url.to_string(),
        }
        .into());
    }

    if let Err(e) = write_stream(response, path).await {
        tokio::fs::remove_file(path).await.ok();
        return Err(e);
    }
    Ok(())
}

async fn write_stream(response: reqwest::Response, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(NetworkError::from)?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
