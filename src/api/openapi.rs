//! OpenAPI document for the REST API.

use utoipa::OpenApi;

/// OpenAPI documentation for all album-dl routes
#[derive(OpenApi)]
#[openapi(
    info(
        title = "album-dl REST API",
        description = "Submit albums of externally sourced tracks, poll job progress, and retrieve packaged archives.",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        crate::api::routes::submit_album,
        crate::api::routes::job_status,
        crate::api::routes::download_archive,
        crate::api::routes::cancel_job,
        crate::api::routes::probe_metadata,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::api::routes::SubmitAlbumRequest,
        crate::api::routes::SubmitAlbumResponse,
        crate::types::Album,
        crate::types::Track,
        crate::types::JobId,
        crate::types::JobPhase,
        crate::types::JobStatus,
        crate::types::TrackMetadata,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "albums", description = "Album job submission and polling"),
        (name = "system", description = "Metadata probing, health, and documentation")
    )
)]
pub struct ApiDoc;
