//! Top-level album job lifecycle.
//!
//! One job runs per submitted album, detached from the request that started
//! it. Within a job the pipeline is strictly sequential -- one track at a
//! time -- which bounds concurrent external-tool invocations and keeps the
//! progress counter unambiguous. The scratch directory and any partial
//! archive are released on every exit path.

use std::path::Path;
use std::sync::Arc;

use crate::archive::Archiver;
use crate::error::{Error, JobError, Result};
use crate::registry::ArtifactHandle;
use crate::sanitize;
use crate::tagger;
use crate::types::{Event, JobPhase, external_audio_quality};

use super::context::JobContext;

/// Execute an album job to completion, recording the terminal state on the
/// registry entry. Never panics the runtime: every failure is captured into
/// the entry's error field and observable via polling.
pub(crate) async fn run_album_job(ctx: JobContext) {
    let id = ctx.id;
    let scratch = ctx.scratch_dir();

    match execute(&ctx, &scratch).await {
        Ok(artifact) => {
            tracing::info!(
                job_id = %id,
                path = %artifact.path.display(),
                "Album job complete"
            );
            ctx.registry
                .update(id, |s| {
                    s.phase = JobPhase::Succeeded;
                    s.status = "Downloaded!".to_string();
                    s.current_track = None;
                    s.artifact_path = Some(artifact.path.clone());
                    s.artifact_name = Some(artifact.filename.clone());
                })
                .await;
            ctx.event_tx
                .send(Event::JobSucceeded {
                    id,
                    filename: artifact.filename,
                })
                .ok();
        }
        Err(e) => {
            let cancelled = matches!(e, Error::Job(JobError::Cancelled { .. }));
            if cancelled {
                tracing::info!(job_id = %id, "Album job cancelled");
            } else {
                tracing::error!(job_id = %id, error = %e, "Album job failed");
            }

            // Best-effort cleanup; the error already recorded is authoritative
            // and cleanup problems must not replace it.
            cleanup_dir(&scratch).await;
            cleanup_file(&ctx.artifact_path()).await;

            let message = e.to_string();
            ctx.registry
                .update(id, |s| {
                    s.phase = JobPhase::Failed;
                    s.status = if cancelled {
                        "Cancelled".to_string()
                    } else {
                        "Error occurred".to_string()
                    };
                    s.current_track = None;
                    s.error = Some(message.clone());
                })
                .await;

            if cancelled {
                ctx.event_tx.send(Event::JobCancelled { id }).ok();
            } else {
                ctx.event_tx
                    .send(Event::JobFailed { id, error: message })
                    .ok();
            }
        }
    }
}

/// The pipeline body: scratch setup, cover fetch, per-track loop, packaging.
async fn execute(ctx: &JobContext, scratch: &Path) -> Result<ArtifactHandle> {
    let id = ctx.id;

    tokio::fs::create_dir_all(scratch).await.map_err(Error::Io)?;

    // Cover art is fetched once per album; failure degrades to "no cover"
    let cover = match ctx.album.cover_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            let fetched = ctx.cover.fetch(url).await;
            match &fetched {
                Some(bytes) => {
                    ctx.event_tx
                        .send(Event::CoverFetched {
                            id,
                            bytes: bytes.len(),
                        })
                        .ok();
                }
                None => {
                    ctx.event_tx.send(Event::CoverUnavailable { id }).ok();
                }
            }
            fetched.map(Arc::new)
        }
        _ => None,
    };

    let mut produced = 0usize;
    let mut attempted = 0usize;

    for track in &ctx.album.tracks {
        if ctx.cancel.is_cancelled() {
            return Err(Error::Job(JobError::Cancelled { id }));
        }

        let name = track.display_name();

        let Some(locator) = track.locator() else {
            // Soft-skip: not fetched, not an error, but still counted as
            // processed so the counter reaches total.
            tracing::info!(job_id = %id, track = %name, "Skipping track with no source");
            ctx.registry
                .update(id, |s| {
                    s.completed += 1;
                    s.current_track = None;
                    s.status = format!("Skipping {name} (no source provided)");
                })
                .await;
            ctx.event_tx
                .send(Event::TrackSkipped {
                    id,
                    track: name.clone(),
                })
                .ok();
            continue;
        };

        attempted += 1;
        ctx.registry
            .update(id, |s| {
                s.current_track = Some(name.clone());
                s.status = format!("Downloading {name}...");
            })
            .await;
        ctx.event_tx
            .send(Event::TrackStarted {
                id,
                track: name.clone(),
            })
            .ok();

        let file_name = sanitize::track_file_name(track.number, &name);
        let dest = scratch.join(&file_name);
        let tool_quality = external_audio_quality(ctx.quality);

        // Cancellation interrupts the wait for the external tool; the tool
        // itself is not killed mid-flight, but its output is discarded with
        // the scratch directory.
        let fetch_result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                cleanup_file(&dest).await;
                return Err(Error::Job(JobError::Cancelled { id }));
            }
            result = ctx.fetcher.fetch(locator, &dest, tool_quality) => result,
        };

        match fetch_result {
            Ok(()) => {
                ctx.registry
                    .update(id, |s| s.status = format!("Tagging {name}..."))
                    .await;

                // id3 writes are blocking file IO
                let owned_track = track.clone();
                let owned_album = ctx.album.clone();
                let owned_cover = cover.clone();
                let tag_path = dest.clone();
                let tagged = tokio::task::spawn_blocking(move || {
                    tagger::tag_track(
                        &tag_path,
                        &owned_track,
                        &owned_album,
                        owned_cover.as_deref().map(|v| v.as_slice()),
                    )
                })
                .await
                .unwrap_or(false);
                if !tagged {
                    tracing::warn!(job_id = %id, track = %name, "Track kept untagged");
                }

                produced += 1;
                ctx.registry
                    .update(id, |s| {
                        s.completed += 1;
                        s.current_track = None;
                        s.status = format!("Downloaded {name}");
                    })
                    .await;
                ctx.event_tx
                    .send(Event::TrackFinished {
                        id,
                        track: name.clone(),
                    })
                    .ok();
            }
            Err(e) => {
                // Soft failure: record it and keep going with the remaining
                // tracks; only a fully failed album is job-fatal.
                tracing::warn!(job_id = %id, track = %name, error = %e, "Track fetch failed");
                cleanup_file(&dest).await;
                ctx.registry
                    .update(id, |s| {
                        s.completed += 1;
                        s.failed += 1;
                        s.current_track = None;
                        s.status = format!("Failed to download {name}");
                    })
                    .await;
                ctx.event_tx
                    .send(Event::TrackFailed {
                        id,
                        track: name.clone(),
                        error: e.to_string(),
                    })
                    .ok();
            }
        }
    }

    if attempted > 0 && produced == 0 {
        return Err(Error::Job(JobError::AllTracksFailed {
            id,
            failed: attempted,
        }));
    }

    // Packaging
    ctx.registry
        .update(id, |s| s.status = "Creating archive...".to_string())
        .await;
    ctx.event_tx.send(Event::Packaging { id }).ok();

    let root_name =
        sanitize::archive_root_name(ctx.album.display_name(), ctx.album.display_artist());
    let filename = format!("{root_name}.zip");
    let artifact_path = ctx.artifact_path();

    let pack_source = scratch.to_path_buf();
    let pack_root = root_name.clone();
    let pack_dest = artifact_path.clone();
    let packed =
        tokio::task::spawn_blocking(move || Archiver::pack(&pack_source, &pack_root, &pack_dest))
            .await;

    match packed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            cleanup_file(&artifact_path).await;
            return Err(e);
        }
        Err(e) => {
            cleanup_file(&artifact_path).await;
            return Err(Error::Other(format!("archive task failed: {e}")));
        }
    }

    // Scratch contents now live inside the archive
    cleanup_dir(scratch).await;

    Ok(ArtifactHandle {
        path: artifact_path,
        filename,
    })
}

/// Remove a job-scoped directory, logging rather than escalating failures
async fn cleanup_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
        }
    }
}

/// Remove a job-scoped file, logging rather than escalating failures
async fn cleanup_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
}
