//! Shared context handed to a spawned album job task

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::cover::CoverArtFetcher;
use crate::fetcher::AudioFetcher;
use crate::registry::JobRegistry;
use crate::types::{Album, Event, JobId};

/// Everything the detached job task needs, captured at submission time.
///
/// The album is immutable for the duration of the job; the registry handle is
/// the only shared mutable state the task touches.
pub(crate) struct JobContext {
    /// This job's identifier
    pub(crate) id: JobId,
    /// The submitted album, read-only from here on
    pub(crate) album: Album,
    /// Caller-facing audio quality (0..=10, higher is better)
    pub(crate) quality: u8,
    /// Registry handle for progress updates
    pub(crate) registry: JobRegistry,
    /// Audio fetch backend
    pub(crate) fetcher: Arc<dyn AudioFetcher>,
    /// Cover art fetcher
    pub(crate) cover: Arc<CoverArtFetcher>,
    /// Lifecycle event channel
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Cancellation token owned by the registry entry
    pub(crate) cancel: CancellationToken,
    /// Directory under which this job creates its scratch space and artifact
    pub(crate) work_root: PathBuf,
}

impl JobContext {
    /// This job's private scratch directory
    pub(crate) fn scratch_dir(&self) -> PathBuf {
        self.work_root.join(format!("job-{}", self.id))
    }

    /// Where this job writes its finished archive
    pub(crate) fn artifact_path(&self) -> PathBuf {
        self.work_root.join(format!("album-{}.zip", self.id))
    }
}
