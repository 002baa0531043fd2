//! Album job handlers: submission, status polling, artifact retrieval,
//! cancellation.

use crate::api::AppState;
use crate::error::ApiError;
use crate::registry::CancelOutcome;
use crate::types::{Album, JobId};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

/// Request body for submitting an album
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SubmitAlbumRequest {
    /// The album to download
    pub album: Album,

    /// Audio quality, 0..=10 (higher is better); omitted means the server
    /// default
    #[serde(default)]
    pub quality: Option<u8>,
}

/// Response body for a successful submission
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitAlbumResponse {
    /// The allocated job identifier, used for all subsequent polling
    pub id: JobId,
}

/// Parse a path segment into a JobId, or produce the 400 response directly
fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    raw.parse::<JobId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::validation(format!("invalid job id: {raw}"))),
        )
            .into_response()
    })
}

/// POST /albums - Submit an album for download
#[utoipa::path(
    post,
    path = "/albums",
    tag = "albums",
    request_body = SubmitAlbumRequest,
    responses(
        (status = 202, description = "Job accepted and scheduled", body = SubmitAlbumResponse),
        (status = 400, description = "Malformed payload or invalid quality"),
        (status = 503, description = "Server is shutting down")
    )
)]
pub async fn submit_album(
    State(state): State<AppState>,
    Json(request): Json<SubmitAlbumRequest>,
) -> Response {
    match state
        .downloader
        .submit_album(request.album, request.quality)
        .await
    {
        Ok(id) => (
            StatusCode::ACCEPTED,
            Json(SubmitAlbumResponse { id }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /albums/:id - Poll a job's progress
#[utoipa::path(
    get,
    path = "/albums/{id}",
    tag = "albums",
    params(
        ("id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Current job status", body = crate::types::JobStatus),
        (status = 400, description = "Malformed job id"),
        (status = 404, description = "Unknown job id")
    )
)]
pub async fn job_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.downloader.job_status(id).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /albums/:id/archive - Retrieve the packaged archive
///
/// Only valid once the job succeeded. Streams the ZIP, evicts the job entry,
/// and deletes the underlying temp file, so a second request observes 404.
#[utoipa::path(
    get,
    path = "/albums/{id}/archive",
    tag = "albums",
    params(
        ("id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "The packaged album archive", content_type = "application/zip"),
        (status = 400, description = "Job not finished successfully yet"),
        (status = 404, description = "Unknown job id")
    )
)]
pub async fn download_archive(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let artifact = match state.downloader.take_artifact(id).await {
        Ok(artifact) => artifact,
        Err(e) => return e.into_response(),
    };

    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(
                job_id = %id,
                path = %artifact.path.display(),
                error = %e,
                "Artifact file missing at delivery time"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("artifact file is missing")),
            )
                .into_response();
        }
    };

    // The entry is already evicted; delete the file now so nothing leaks.
    // The open handle keeps the stream alive on Unix; on platforms where the
    // delete fails while open, the sweeper-free temp dir is the fallback.
    if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
        tracing::warn!(
            job_id = %id,
            path = %artifact.path.display(),
            error = %e,
            "Failed to delete delivered artifact"
        );
    }

    let body = Body::from_stream(ReaderStream::new(file));
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// DELETE /albums/:id - Cancel a running job or discard a finished one
#[utoipa::path(
    delete,
    path = "/albums/{id}",
    tag = "albums",
    params(
        ("id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Cancellation signalled or entry discarded"),
        (status = 400, description = "Malformed job id"),
        (status = 404, description = "Unknown job id")
    )
)]
pub async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.downloader.cancel_job(id).await {
        Ok(outcome) => {
            let action = match outcome {
                CancelOutcome::Signalled => "cancelled",
                CancelOutcome::Discarded => "discarded",
            };
            (StatusCode::OK, Json(json!({"id": id, "action": action}))).into_response()
        }
        Err(e) => e.into_response(),
    }
}
