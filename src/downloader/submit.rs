//! Album submission and job spawning.

use std::sync::atomic::Ordering;

use crate::error::{Error, FetchError, Result};
use crate::job::{JobContext, run_album_job};
use crate::types::{Album, Event, JobId, MAX_AUDIO_QUALITY};

use super::AlbumDownloader;

impl AlbumDownloader {
    /// Submit an album for download.
    ///
    /// Allocates a registry entry, spawns the job task detached from the
    /// caller, and returns the job id immediately. Progress is observable via
    /// [`job_status`](AlbumDownloader::job_status) and the event channel.
    ///
    /// `quality` is the caller-facing audio quality (0..=10, higher is
    /// better); `None` uses the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] after shutdown has begun, or an
    /// invalid-quality error when `quality` is out of range.
    pub async fn submit_album(&self, album: Album, quality: Option<u8>) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let quality = quality.unwrap_or(self.config.download.default_quality);
        if quality > MAX_AUDIO_QUALITY {
            return Err(Error::Fetch(FetchError::InvalidQuality {
                requested: quality,
                max: MAX_AUDIO_QUALITY,
            }));
        }

        let total = u32::try_from(album.tracks.len()).unwrap_or(u32::MAX);
        let (id, cancel) = self.registry.create(total).await;

        tracing::info!(
            job_id = %id,
            album = %album.display_name(),
            tracks = total,
            quality,
            "Album job submitted"
        );
        self.event_tx.send(Event::JobQueued { id, total }).ok();

        let ctx = JobContext {
            id,
            album,
            quality,
            registry: self.registry.clone(),
            fetcher: self.fetcher.clone(),
            cover: self.cover.clone(),
            event_tx: self.event_tx.clone(),
            cancel,
            work_root: self.config.temp_dir().clone(),
        };

        // The job runs detached; the handle is retained on the registry entry
        // so cancellation and shutdown can reach it.
        let handle = tokio::spawn(run_album_job(ctx));
        self.registry.attach_handle(id, handle).await;

        Ok(id)
    }
}
