//! External audio fetching
//!
//! The actual media extraction is delegated to an external tool (yt-dlp).
//! The [`AudioFetcher`] trait is the seam: the production implementation
//! shells out, tests inject a mock, and embedders can plug in their own
//! backend without touching the job pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::config::ToolsConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::TrackMetadata;

/// Binary the default fetcher shells out to
const FETCH_TOOL: &str = "yt-dlp";

/// How much stderr to keep when reporting a failed invocation
const STDERR_TAIL_BYTES: usize = 500;

/// Materializes a track's audio at a path, given its source locator
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Fetch `locator` and write MP3 audio to `dest`.
    ///
    /// `audio_quality` is on the tool's scale (0 = best) -- callers invert
    /// the user-facing value with [`crate::types::external_audio_quality`]
    /// before calling.
    async fn fetch(&self, locator: &str, dest: &Path, audio_quality: u8) -> Result<()>;

    /// Probe `locator` for track metadata without downloading the audio
    async fn probe(&self, locator: &str) -> Result<TrackMetadata>;
}

/// CLI-based fetcher invoking the external yt-dlp binary
///
/// # Examples
///
/// ```no_run
/// use album_dl::fetcher::YtDlpFetcher;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug)]
pub struct YtDlpFetcher {
    binary_path: PathBuf,
}

impl YtDlpFetcher {
    /// Create a fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which(FETCH_TOOL).ok().map(Self::new)
    }

    /// Resolve a fetcher from the tools configuration: an explicit path wins,
    /// otherwise PATH is searched when `search_path` is enabled.
    pub fn discover(tools: &ToolsConfig) -> Result<Self> {
        if let Some(path) = &tools.ytdlp_path {
            return Ok(Self::new(path.clone()));
        }
        if tools.search_path
            && let Some(fetcher) = Self::from_path()
        {
            return Ok(fetcher);
        }
        Err(Error::Fetch(FetchError::ToolNotFound {
            name: FETCH_TOOL.to_string(),
        }))
    }
}

/// Keep the last `limit` bytes of a process's stderr, lossily decoded
fn stderr_tail(stderr: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= limit {
        trimmed.to_string()
    } else {
        let start = trimmed.len() - limit;
        // Avoid splitting a UTF-8 sequence
        let boundary = (start..trimmed.len())
            .find(|i| trimmed.is_char_boundary(*i))
            .unwrap_or(trimmed.len());
        trimmed[boundary..].to_string()
    }
}

/// Map a metadata JSON dump to the fields the submission UI cares about.
///
/// Fallback chain mirrors what the tool reports: a dedicated track title is
/// preferred over the media title, an artist over the uploader over the
/// channel.
fn parse_metadata_json(info: &serde_json::Value) -> TrackMetadata {
    let pick = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .filter_map(|k| info.get(*k).and_then(|v| v.as_str()))
            .map(str::to_string)
            .next()
    };

    TrackMetadata {
        track: pick(&["track", "title"]),
        artist: pick(&["artist", "uploader", "channel"]),
        album: pick(&["album"]),
        track_number: info
            .get("track_number")
            .and_then(|v| v.as_u64())
            .and_then(|n| u32::try_from(n).ok()),
        duration_secs: info.get("duration").and_then(|v| v.as_f64()),
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    async fn fetch(&self, locator: &str, dest: &Path, audio_quality: u8) -> Result<()> {
        tracing::debug!(
            locator,
            dest = %dest.display(),
            audio_quality,
            "invoking fetch tool"
        );

        let output = Command::new(&self.binary_path)
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg(audio_quality.to_string())
            .arg("--no-warnings")
            .arg("--output")
            .arg(dest)
            .arg(locator)
            .output()
            .await
            .map_err(|e| {
                Error::Fetch(FetchError::Invocation {
                    reason: e.to_string(),
                })
            })?;

        if !output.status.success() {
            return Err(Error::Fetch(FetchError::ToolFailed {
                locator: locator.to_string(),
                status: output.status.code(),
                stderr: stderr_tail(&output.stderr, STDERR_TAIL_BYTES),
            }));
        }

        Ok(())
    }

    async fn probe(&self, locator: &str) -> Result<TrackMetadata> {
        let output = Command::new(&self.binary_path)
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg(locator)
            .output()
            .await
            .map_err(|e| {
                Error::Fetch(FetchError::Invocation {
                    reason: e.to_string(),
                })
            })?;

        if !output.status.success() {
            return Err(Error::Fetch(FetchError::ToolFailed {
                locator: locator.to_string(),
                status: output.status.code(),
                stderr: stderr_tail(&output.stderr, STDERR_TAIL_BYTES),
            }));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::Fetch(FetchError::InvalidMetadata {
                locator: locator.to_string(),
                reason: e.to_string(),
            })
        })?;

        Ok(parse_metadata_json(&info))
    }
}
