//! Shared test helpers for creating AlbumDownloader instances in tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::downloader::AlbumDownloader;
use crate::error::{Error, FetchError, Result};
use crate::fetcher::AudioFetcher;
use crate::types::{Album, JobId, JobPhase, JobStatus, Track, TrackMetadata};

/// Payload the mock fetcher writes for every "downloaded" track
pub(crate) const FAKE_AUDIO: &[u8] = b"fake mp3 audio payload";

/// In-memory fetch backend: writes a fixed payload instead of shelling out.
///
/// Locators listed in `fail_locators` fail with a tool error; an optional
/// delay simulates a slow external tool for cancellation and premature-poll
/// tests.
pub(crate) struct MockFetcher {
    fail_locators: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, u8)>>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self {
            fail_locators: HashSet::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_on(locators: &[&str]) -> Self {
        Self {
            fail_locators: locators.iter().map(|s| s.to_string()).collect(),
            ..Self::new()
        }
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Locator/quality pairs this fetcher has been invoked with, in order
    pub(crate) async fn calls(&self) -> Vec<(String, u8)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AudioFetcher for MockFetcher {
    async fn fetch(&self, locator: &str, dest: &Path, audio_quality: u8) -> Result<()> {
        self.calls
            .lock()
            .await
            .push((locator.to_string(), audio_quality));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_locators.contains(locator) {
            return Err(Error::Fetch(FetchError::ToolFailed {
                locator: locator.to_string(),
                status: Some(1),
                stderr: "simulated fetch failure".to_string(),
            }));
        }

        tokio::fs::write(dest, FAKE_AUDIO).await.map_err(Error::Io)
    }

    async fn probe(&self, _locator: &str) -> Result<TrackMetadata> {
        Ok(TrackMetadata {
            track: Some("Probed Title".into()),
            artist: Some("Probed Artist".into()),
            album: Some("Probed Album".into()),
            track_number: Some(1),
            duration_secs: Some(123.0),
        })
    }
}

/// Test config with scratch space inside the given directory and fast sweeps
pub(crate) fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.download.temp_dir = root.join("work");
    config.jobs.job_ttl_secs = 3600;
    config.jobs.sweep_interval_secs = 1;
    config
}

/// Helper to create a test AlbumDownloader with a default mock fetcher.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader() -> (AlbumDownloader, TempDir) {
    create_test_downloader_with(Arc::new(MockFetcher::new()))
}

/// Helper to create a test AlbumDownloader around a specific fetcher
pub(crate) fn create_test_downloader_with(
    fetcher: Arc<dyn AudioFetcher>,
) -> (AlbumDownloader, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());
    let downloader = AlbumDownloader::with_fetcher(config, fetcher).unwrap();
    (downloader, temp_dir)
}

/// The concrete album from the polling-protocol scenario: track 1 has a
/// quoted name and a source, track 2 has no source and is soft-skipped.
pub(crate) fn sample_album() -> Album {
    Album {
        name: "Test".into(),
        artist: "Artist".into(),
        year: Some(2020),
        cover_url: None,
        tracks: vec![
            Track {
                number: 1,
                name: "A\"B".into(),
                artists: vec!["Artist".into()],
                duration_secs: Some(100),
                source_url: Some("u1".into()),
            },
            Track {
                number: 2,
                name: "C".into(),
                artists: vec![],
                duration_secs: Some(90),
                source_url: Some("".into()),
            },
        ],
    }
}

/// Poll until the job reaches a terminal phase or the timeout elapses
pub(crate) async fn wait_for_terminal(
    downloader: &AlbumDownloader,
    id: JobId,
    timeout: Duration,
) -> JobStatus {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let status = downloader.job_status(id).await.unwrap();
        if status.phase != JobPhase::Running {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "job {id} did not reach a terminal phase within {timeout:?}: {status:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
