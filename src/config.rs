//! Configuration types for album-dl

use crate::error::{Error, Result};
use crate::types::MAX_AUDIO_QUALITY;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Download behavior configuration (scratch space, default quality)
///
/// Groups settings related to how album jobs stage and fetch their files.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Scratch and artifact directory (default: `<system temp>/album-dl`)
    ///
    /// Each job gets its own subdirectory here, and finished archives are
    /// written here until delivered or swept.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Default audio quality when a submission does not specify one
    /// (0..=10, higher is better; default: 10)
    #[serde(default = "default_audio_quality")]
    pub default_quality: u8,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            default_quality: default_audio_quality(),
        }
    }
}

/// Cover art processing configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Largest allowed cover dimension in pixels; bigger images are
    /// downsampled preserving aspect ratio (default: 500)
    #[serde(default = "default_cover_max_dimension")]
    pub cover_max_dimension: u32,

    /// JPEG re-encode quality, 1..=100 (default: 90)
    #[serde(default = "default_cover_jpeg_quality")]
    pub cover_jpeg_quality: u8,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            cover_max_dimension: default_cover_max_dimension(),
            cover_jpeg_quality: default_cover_jpeg_quality(),
        }
    }
}

/// External tool configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for the fetch binary if no explicit path is set
    /// (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
        }
    }
}

/// Job registry housekeeping configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobsConfig {
    /// How long finished jobs (and their undelivered artifacts) are kept
    /// before the sweeper evicts them, in seconds (default: 3600)
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,

    /// How often the sweeper runs, in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            job_ttl_secs: default_job_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// REST API configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:6789)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Whether to add a CORS layer (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" or an empty list allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI at /swagger-ui
    /// (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`crate::AlbumDownloader`]
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — scratch space and default quality
/// - [`cover`](CoverConfig) — cover art bounds
/// - [`tools`](ToolsConfig) — external binary discovery
/// - [`jobs`](JobsConfig) — registry TTL and sweep cadence
/// - [`api`](ApiConfig) — REST server settings
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Cover art processing settings
    #[serde(flatten)]
    pub cover: CoverConfig,

    /// External tool settings
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// Job registry housekeeping
    #[serde(flatten)]
    pub jobs: JobsConfig,

    /// REST API settings
    #[serde(flatten)]
    pub api: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.download.default_quality > MAX_AUDIO_QUALITY {
            return Err(Error::Config {
                message: format!(
                    "default_quality {} exceeds maximum {}",
                    self.download.default_quality, MAX_AUDIO_QUALITY
                ),
                key: Some("default_quality".into()),
            });
        }
        if self.cover.cover_jpeg_quality == 0 || self.cover.cover_jpeg_quality > 100 {
            return Err(Error::Config {
                message: format!(
                    "cover_jpeg_quality {} must be in 1..=100",
                    self.cover.cover_jpeg_quality
                ),
                key: Some("cover_jpeg_quality".into()),
            });
        }
        if self.cover.cover_max_dimension == 0 {
            return Err(Error::Config {
                message: "cover_max_dimension must be positive".into(),
                key: Some("cover_max_dimension".into()),
            });
        }
        if self.jobs.sweep_interval_secs == 0 {
            return Err(Error::Config {
                message: "sweep_interval_secs must be positive".into(),
                key: Some("sweep_interval_secs".into()),
            });
        }
        Ok(())
    }

    /// Scratch and artifact directory
    pub fn temp_dir(&self) -> &PathBuf {
        &self.download.temp_dir
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("album-dl")
}

fn default_audio_quality() -> u8 {
    MAX_AUDIO_QUALITY
}

fn default_cover_max_dimension() -> u32 {
    500
}

fn default_cover_jpeg_quality() -> u8 {
    90
}

fn default_job_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_bind_address() -> SocketAddr {
    // Panic-free: the literal always parses
    SocketAddr::from(([127, 0, 0, 1], 6789))
}

fn default_true() -> bool {
    true
}
