//! Job lifecycle control -- status polling, artifact retrieval, cancellation,
//! and shutdown coordination.

use std::sync::atomic::Ordering;

use crate::error::{Error, JobError, Result};
use crate::registry::{ArtifactHandle, CancelOutcome};
use crate::types::{Event, JobId, JobStatus, TrackMetadata};

use super::AlbumDownloader;

impl AlbumDownloader {
    /// Snapshot a job's progress
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown (or already retrieved/evicted)
    /// job ids.
    pub async fn job_status(&self, id: JobId) -> Result<JobStatus> {
        self.registry
            .snapshot(id)
            .await
            .ok_or(Error::Job(JobError::NotFound { id }))
    }

    /// Hand out a finished job's artifact, evicting the registry entry.
    ///
    /// The caller takes ownership of the file at the returned path and is
    /// responsible for deleting it after delivery. A second call for the same
    /// id observes the eviction and reports not-found.
    ///
    /// # Errors
    ///
    /// Not-found for unknown ids; not-ready while the job is still running or
    /// after it failed.
    pub async fn take_artifact(&self, id: JobId) -> Result<ArtifactHandle> {
        let artifact = self.registry.take_artifact(id).await?;
        tracing::info!(
            job_id = %id,
            path = %artifact.path.display(),
            "Artifact handed out, job entry evicted"
        );
        Ok(artifact)
    }

    /// Cancel a running job, or discard a finished one.
    ///
    /// Cancellation is observed by the job between tracks; the entry then
    /// records the failed phase and stays pollable until swept or discarded.
    /// Discarding a finished job removes its entry and deletes any
    /// undelivered artifact.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown job ids.
    pub async fn cancel_job(&self, id: JobId) -> Result<CancelOutcome> {
        match self.registry.cancel(id).await {
            Some(outcome) => {
                tracing::info!(job_id = %id, ?outcome, "Cancel requested");
                Ok(outcome)
            }
            None => Err(Error::Job(JobError::NotFound { id })),
        }
    }

    /// Probe a source locator for track metadata without downloading audio
    pub async fn probe_metadata(&self, locator: &str) -> Result<TrackMetadata> {
        self.fetcher.probe(locator).await
    }

    /// Gracefully shut down: stop accepting submissions, cancel all running
    /// jobs, and wait for their tasks to finish their cleanup paths.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down album downloader");
        self.accepting_new.store(false, Ordering::SeqCst);
        self.event_tx.send(Event::Shutdown).ok();

        self.registry.cancel_all().await;
        let handles = self.registry.drain_handles().await;
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Job task ended abnormally during shutdown");
            }
        }

        tracing::info!("Album downloader shut down");
        Ok(())
    }
}
