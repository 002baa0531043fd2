//! In-memory job registry
//!
//! The registry is the single resource shared between album jobs and
//! concurrent status pollers. Each entry is written by exactly one job task
//! and read by any number of pollers; a tokio mutex around the map keeps
//! snapshots consistent, and the lock is never held across an await point.
//!
//! Entries also own the job's cancellation token and, once spawned, its task
//! handle, so cancellation and shutdown work without any side tables. Nothing
//! here persists: the registry's lifetime is the process lifetime, and jobs
//! are not resumable across restarts.

use crate::error::{Error, JobError, Result};
use crate::types::{JobId, JobPhase, JobStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Mutable progress state of a single job, owned by the registry
#[derive(Clone, Debug)]
pub(crate) struct JobState {
    /// Tracks processed so far (fetched, skipped, or failed)
    pub(crate) completed: u32,
    /// Total number of tracks, fixed at creation
    pub(crate) total: u32,
    /// Tracks whose fetch failed
    pub(crate) failed: u32,
    /// Human-readable progress message
    pub(crate) status: String,
    /// Track currently being processed
    pub(crate) current_track: Option<String>,
    /// Terminal error message
    pub(crate) error: Option<String>,
    /// Lifecycle phase
    pub(crate) phase: JobPhase,
    /// Finished artifact location, set only on success
    pub(crate) artifact_path: Option<PathBuf>,
    /// Suggested artifact filename, set only on success
    pub(crate) artifact_name: Option<String>,
}

impl JobState {
    fn new(total: u32) -> Self {
        Self {
            completed: 0,
            total,
            failed: 0,
            status: "Starting download...".to_string(),
            current_track: None,
            error: None,
            phase: JobPhase::Running,
            artifact_path: None,
            artifact_name: None,
        }
    }
}

/// A registry entry: job state plus the handles that manage its task
struct JobEntry {
    state: JobState,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    finished_at: Option<Instant>,
}

/// Location and suggested filename of a finished artifact
#[derive(Clone, Debug)]
pub struct ArtifactHandle {
    /// Path of the packaged archive on disk
    pub path: PathBuf,
    /// Suggested download filename, e.g. `Test - Artist.zip`
    pub filename: String,
}

/// Outcome of [`JobRegistry::cancel`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was still running; its cancellation token was triggered
    Signalled,
    /// The job had already finished; its entry (and any artifact) was discarded
    Discarded,
}

/// Process-wide map from job id to job state
///
/// Cheap to clone; all clones share the same underlying map.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<Mutex<HashMap<JobId, JobEntry>>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Allocate a fresh job id and insert its initial state.
    ///
    /// The entry starts with `completed = 0`, phase `Running`, and the
    /// "Starting download..." status message. Returns the id together with
    /// the entry's cancellation token for the job task to observe.
    pub async fn create(&self, total: u32) -> (JobId, CancellationToken) {
        let id = JobId::new();
        let cancel = CancellationToken::new();
        let entry = JobEntry {
            state: JobState::new(total),
            cancel: cancel.clone(),
            handle: None,
            finished_at: None,
        };
        self.inner.lock().await.insert(id, entry);
        (id, cancel)
    }

    /// Retain the spawned task handle on its entry.
    ///
    /// A no-op for unknown ids (the entry may already have been discarded).
    pub async fn attach_handle(&self, id: JobId, handle: JoinHandle<()>) {
        if let Some(entry) = self.inner.lock().await.get_mut(&id) {
            entry.handle = Some(handle);
        }
    }

    /// Apply a mutation to a job's state.
    ///
    /// Silently a no-op if the id is unknown; by construction the only caller
    /// is the owning job task, which cannot race with entry creation. When the
    /// mutation moves the job into a terminal phase the finish timestamp is
    /// recorded for the TTL sweeper.
    pub(crate) async fn update<F>(&self, id: JobId, mutate: F)
    where
        F: FnOnce(&mut JobState),
    {
        if let Some(entry) = self.inner.lock().await.get_mut(&id) {
            mutate(&mut entry.state);
            if entry.state.phase.is_terminal() && entry.finished_at.is_none() {
                entry.finished_at = Some(Instant::now());
            }
        }
    }

    /// Snapshot a job's progress for a polling client
    pub async fn snapshot(&self, id: JobId) -> Option<JobStatus> {
        self.inner.lock().await.get(&id).map(|entry| {
            let s = &entry.state;
            JobStatus {
                id,
                completed: s.completed,
                total: s.total,
                failed: s.failed,
                status: s.status.clone(),
                current_track: s.current_track.clone(),
                error: s.error.clone(),
                phase: s.phase,
                done: s.phase == JobPhase::Succeeded,
            }
        })
    }

    /// Remove a successfully finished job and hand out its artifact.
    ///
    /// The entry is evicted atomically with the phase check, so a second
    /// retrieval attempt observes "not found". Jobs that are still running or
    /// have failed are left untouched and reported as not ready.
    pub async fn take_artifact(&self, id: JobId) -> Result<ArtifactHandle> {
        let mut map = self.inner.lock().await;
        let entry = map
            .get(&id)
            .ok_or(Error::Job(JobError::NotFound { id }))?;

        if entry.state.phase != JobPhase::Succeeded {
            return Err(Error::Job(JobError::NotReady {
                id,
                phase: entry.state.phase.to_string(),
            }));
        }

        // Phase checked above; a succeeded job always carries its artifact
        let (path, filename) = match (&entry.state.artifact_path, &entry.state.artifact_name) {
            (Some(p), Some(n)) => (p.clone(), n.clone()),
            _ => {
                return Err(Error::Other(format!(
                    "job {id} succeeded but has no artifact recorded"
                )));
            }
        };

        map.remove(&id);
        Ok(ArtifactHandle { path, filename })
    }

    /// Cancel a running job, or discard a finished one.
    ///
    /// Discarding removes the entry and deletes any undelivered artifact
    /// file. Returns `None` for unknown ids.
    pub async fn cancel(&self, id: JobId) -> Option<CancelOutcome> {
        let mut map = self.inner.lock().await;
        let entry = map.get(&id)?;

        if entry.state.phase == JobPhase::Running {
            entry.cancel.cancel();
            Some(CancelOutcome::Signalled)
        } else {
            if let Some(entry) = map.remove(&id)
                && let Some(path) = entry.state.artifact_path
                && let Err(e) = std::fs::remove_file(&path)
            {
                tracing::warn!(
                    job_id = %id,
                    path = %path.display(),
                    error = %e,
                    "Failed to delete discarded artifact"
                );
            }
            Some(CancelOutcome::Discarded)
        }
    }

    /// Trigger every entry's cancellation token (used during shutdown)
    pub async fn cancel_all(&self) {
        for entry in self.inner.lock().await.values() {
            entry.cancel.cancel();
        }
    }

    /// Take all retained task handles, leaving the entries in place.
    ///
    /// Shutdown awaits these so no job task outlives the downloader.
    pub async fn drain_handles(&self) -> Vec<JoinHandle<()>> {
        self.inner
            .lock()
            .await
            .values_mut()
            .filter_map(|entry| entry.handle.take())
            .collect()
    }

    /// Evict finished entries older than `ttl`, deleting their artifacts.
    ///
    /// Running jobs are never touched. Returns the number of entries removed.
    pub async fn sweep_expired(&self, ttl: Duration) -> usize {
        let mut map = self.inner.lock().await;
        let expired: Vec<JobId> = map
            .iter()
            .filter(|(_, entry)| {
                entry
                    .finished_at
                    .is_some_and(|finished| finished.elapsed() >= ttl)
            })
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(entry) = map.remove(id)
                && let Some(path) = entry.state.artifact_path
                && let Err(e) = std::fs::remove_file(&path)
            {
                tracing::warn!(
                    job_id = %id,
                    path = %path.display(),
                    error = %e,
                    "Failed to delete swept artifact"
                );
            }
            tracing::info!(job_id = %id, "Swept expired job entry");
        }

        expired.len()
    }

    /// Number of live entries (running and finished-but-unretrieved)
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the registry holds no entries
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
