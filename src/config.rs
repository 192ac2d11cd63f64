//! Configuration types for torrent-courier

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level pipeline configuration
///
/// Works out of the box: every field has a sensible default matching the
/// conventional on-disk layout (a `downloads/` destination, a `torrents/`
/// descriptor staging directory, a `thumbs/` preview staging directory).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory completed transfers land in (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Staging directory for fetched torrent descriptor files
    /// (default: "./torrents")
    #[serde(default = "default_descriptor_dir")]
    pub descriptor_dir: PathBuf,

    /// Preview resolution settings
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            descriptor_dir: default_descriptor_dir(),
            preview: PreviewConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

/// Preview-image resolution configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Staging directory for generated/downloaded previews (default: "./thumbs")
    #[serde(default = "default_preview_staging_dir")]
    pub staging_dir: PathBuf,

    /// Directory checked for operator-supplied preview files under the
    /// conventional names (default: ".")
    #[serde(default = "default_preview_lookup_dir")]
    pub lookup_dir: PathBuf,

    /// Optional URL of a default preview fetched when extraction fails
    #[serde(default)]
    pub default_url: Option<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_preview_staging_dir(),
            lookup_dir: default_preview_lookup_dir(),
            default_url: None,
        }
    }
}

/// Delivery configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Destination channel on the messaging backend
    #[serde(default)]
    pub channel: String,

    /// Send media as a generic file attachment instead of a playable video
    /// (default: false). Requests may override this per artifact.
    #[serde(default)]
    pub as_document: bool,

    /// Minimum wall time between progress reports; the final report always
    /// fires regardless (default: 7 seconds)
    #[serde(default = "default_progress_interval", with = "duration_serde")]
    pub progress_interval: Duration,

    /// Rate-limit backoff policy
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            as_document: false,
            progress_interval: default_progress_interval(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Backoff policy for backend-imposed rate limits
///
/// The backend's demanded wait is multiplied by `backoff_multiplier` before
/// sleeping, and the whole send is retried from the top. Retries are bounded
/// by `max_retries`; exhausting the budget surfaces
/// [`crate::DeliveryError::RetriesExhausted`] to the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Safety margin applied to the backend's demanded wait (default: 1.5)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Maximum number of rate-limit retries per delivery (default: 10)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backoff_multiplier: 1.5,
            max_retries: 10,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_descriptor_dir() -> PathBuf {
    PathBuf::from("./torrents")
}

fn default_preview_staging_dir() -> PathBuf {
    PathBuf::from("./thumbs")
}

fn default_preview_lookup_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(7)
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_max_retries() -> u32 {
    10
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
