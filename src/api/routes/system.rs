//! System handlers: metadata probe, health check, OpenAPI document.

use crate::api::{ApiDoc, AppState};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::OpenApi;

use crate::error::ApiError;

/// Query parameters for the metadata probe
#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    /// Source locator to probe
    #[serde(default)]
    pub url: Option<String>,
}

/// GET /metadata?url= - Probe a source locator for track metadata
///
/// Lets a client prefill track fields before assembling an album, without
/// downloading any audio.
#[utoipa::path(
    get,
    path = "/metadata",
    tag = "system",
    params(
        ("url" = Option<String>, Query, description = "Source locator to probe")
    ),
    responses(
        (status = 200, description = "Probed metadata", body = crate::types::TrackMetadata),
        (status = 400, description = "Missing url parameter"),
        (status = 502, description = "Fetch tool failed to probe the locator")
    )
)]
pub async fn probe_metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Response {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError::validation("missing required parameter: url")),
            )
                .into_response();
        }
    };

    match state.downloader.probe_metadata(&url).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.x document")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
