//! Descriptor retrieval: turning a direct-download link into a local
//! torrent descriptor file
//!
//! The fetcher streams the HTTP body into a `.part` file inside the staging
//! directory and promotes it to its final name only after the stream has been
//! fully written, so a caller never observes a half-written descriptor as a
//! valid result.

use crate::error::Result;
use crate::utils::{download_to_file, filename_from_url};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Suffix appended when the URL's trailing segment lacks one
const DESCRIPTOR_SUFFIX: &str = ".torrent";

/// Fetches torrent descriptor files over HTTP into a staging directory
#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
    descriptor_dir: PathBuf,
}

impl SourceFetcher {
    /// Create a fetcher staging descriptors under `descriptor_dir`
    pub fn new(descriptor_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            descriptor_dir,
        }
    }

    /// Retrieve `url` into the staging directory and return the descriptor path
    ///
    /// The filename is derived from the URL's trailing path segment, with
    /// `.torrent` appended if absent. A non-success response status fails
    /// with a [`NetworkError`] and leaves no promoted file behind.
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let mut name = filename_from_url(url)?;
        if !name.ends_with(DESCRIPTOR_SUFFIX) {
            name.push_str(DESCRIPTOR_SUFFIX);
        }

        tokio::fs::create_dir_all(&self.descriptor_dir).await?;
        let final_path = self.descriptor_dir.join(&name);
        let part_path = self.descriptor_dir.join(format!("{}.part", name));

        debug!(url, descriptor = %final_path.display(), "fetching descriptor");

        if let Err(e) = download_to_file(&self.client, url, &part_path).await {
            warn!(url, error = %e, "descriptor fetch failed");
            return Err(e);
        }

        tokio::fs::rename(&part_path, &final_path).await?;
        info!(descriptor = %final_path.display(), "descriptor fetched");
        Ok(final_path)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, NetworkError};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_writes_descriptor_with_suffix_appended() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases/ep01"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"d8:announce0:e".to_vec()))
            .mount(&server)
            .await;

        let staging = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(staging.path().to_path_buf());
        let url = format!("{}/releases/ep01", server.uri());

        let descriptor = fetcher.fetch(&url).await.unwrap();
        assert_eq!(
            descriptor.file_name().unwrap().to_str().unwrap(),
            "ep01.torrent"
        );
        let body = std::fs::read(&descriptor).unwrap();
        assert_eq!(body, b"d8:announce0:e");
        // No .part leftovers
        assert!(!staging.path().join("ep01.torrent.part").exists());
    }

    #[tokio::test]
    async fn test_fetch_keeps_existing_suffix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dl/ep02.torrent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"meta".to_vec()))
            .mount(&server)
            .await;

        let staging = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(staging.path().to_path_buf());
        let url = format!("{}/dl/ep02.torrent", server.uri());

        let descriptor = fetcher.fetch(&url).await.unwrap();
        assert_eq!(
            descriptor.file_name().unwrap().to_str().unwrap(),
            "ep02.torrent"
        );
    }

    #[tokio::test]
    async fn test_fetch_fails_on_http_error_without_promoting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.torrent"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let staging = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(staging.path().to_path_buf());
        let url = format!("{}/gone.torrent", server.uri());

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Network(NetworkError::Status { status, .. }) if status.as_u16() == 404
        ));
        assert!(!staging.path().join("gone.torrent").exists());
    }

    #[tokio::test]
    async fn test_fetch_creates_staging_dir() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.torrent"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("torrents");
        let fetcher = SourceFetcher::new(staging.clone());
        fetcher
            .fetch(&format!("{}/a.torrent", server.uri()))
            .await
            .unwrap();
        assert!(staging.join("a.torrent").exists());
    }
}
