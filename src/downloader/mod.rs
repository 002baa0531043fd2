//! Core downloader implementation split into focused submodules.
//!
//! The `AlbumDownloader` struct and its methods are organized by domain:
//! - [`submit`] - Album submission and job spawning
//! - [`control`] - Status polling, artifact retrieval, cancellation, shutdown
//! - [`services`] - Background service starters (registry sweeper)

mod control;
mod services;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::cover::CoverArtFetcher;
use crate::error::Result;
use crate::fetcher::{AudioFetcher, YtDlpFetcher};
use crate::registry::JobRegistry;
use crate::types::Event;

/// Capacity of the lifecycle event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the job registry, the fetch backends, and the event channel. The REST
/// API layer and any number of background tasks share one instance through
/// cheap clones.
#[derive(Clone)]
pub struct AlbumDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Process-wide job registry
    pub(crate) registry: JobRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Audio fetch backend (trait object for pluggable implementations)
    pub(crate) fetcher: Arc<dyn AudioFetcher>,
    /// Cover art fetcher
    pub(crate) cover: Arc<CoverArtFetcher>,
    /// Flag to indicate whether new jobs are accepted (false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl AlbumDownloader {
    /// Create a new AlbumDownloader instance
    ///
    /// Validates the configuration, prepares the scratch directory, and
    /// discovers the external fetch binary. Fails fast when the binary cannot
    /// be found so a misconfigured deployment surfaces immediately instead of
    /// on the first job.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher: Arc<dyn AudioFetcher> = Arc::new(YtDlpFetcher::discover(&config.tools)?);
        tokio::fs::create_dir_all(config.temp_dir()).await?;
        Ok(Self::assemble(config, fetcher))
    }

    /// Create a downloader with a custom fetch backend.
    ///
    /// Skips binary discovery; used by embedders with their own media source
    /// and by tests injecting a mock.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn AudioFetcher>) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(config.temp_dir())?;
        Ok(Self::assemble(config, fetcher))
    }

    fn assemble(config: Config, fetcher: Arc<dyn AudioFetcher>) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cover = Arc::new(CoverArtFetcher::new(&config.cover));

        Self {
            config: Arc::new(config),
            registry: JobRegistry::new(),
            event_tx,
            fetcher,
            cover,
            accepting_new: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Subscribe to job lifecycle events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this downloader was built with
    pub fn config(&self) -> &Config {
        &self.config
    }
}
