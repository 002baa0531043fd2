//! Error types for album-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Job, Fetch, Archive)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for album-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for album-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "temp_dir")
        key: Option<String>,
    },

    /// Album job error
    #[error("job error: {0}")]
    Job(#[from] JobError),

    /// Audio fetch error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Archive packaging error
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Album-job errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Job not found in the registry
    #[error("job {id} not found")]
    NotFound {
        /// The job id that was not found
        id: JobId,
    },

    /// Artifact requested before the job finished successfully
    #[error("job {id} has no artifact yet (phase: {phase})")]
    NotReady {
        /// The job whose artifact was requested
        id: JobId,
        /// The phase the job is currently in
        phase: String,
    },

    /// Every track that had a source locator failed to fetch
    #[error("job {id} failed: all {failed} fetchable tracks failed")]
    AllTracksFailed {
        /// The failed job
        id: JobId,
        /// Number of tracks that were attempted and failed
        failed: usize,
    },

    /// Job was cancelled before it finished
    #[error("job {id} was cancelled")]
    Cancelled {
        /// The cancelled job
        id: JobId,
    },
}

/// Audio-fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// External fetch binary could not be found
    #[error("fetch tool '{name}' not found in PATH or configuration")]
    ToolNotFound {
        /// The binary name that was searched for
        name: String,
    },

    /// External fetch tool could not be spawned
    #[error("failed to invoke fetch tool: {reason}")]
    Invocation {
        /// Why the spawn failed
        reason: String,
    },

    /// External fetch tool exited with a failure
    #[error("fetch failed for {locator} (exit: {status:?}): {stderr}")]
    ToolFailed {
        /// The source locator being fetched
        locator: String,
        /// Process exit code, if one was produced
        status: Option<i32>,
        /// Tail of the tool's stderr output
        stderr: String,
    },

    /// Requested audio quality is outside the accepted range
    #[error("invalid audio quality {requested}, must be 0..={max}")]
    InvalidQuality {
        /// The quality the caller asked for
        requested: u8,
        /// The maximum accepted value
        max: u8,
    },

    /// Metadata probe output could not be parsed
    #[error("failed to parse metadata for {locator}: {reason}")]
    InvalidMetadata {
        /// The probed locator
        locator: String,
        /// Why parsing failed
        reason: String,
    },
}

/// Archive packaging errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Source directory missing or unreadable
    #[error("archive source {path} is not readable: {reason}")]
    SourceUnreadable {
        /// The directory that was to be packaged
        path: PathBuf,
        /// Why it could not be read
        reason: String,
    },

    /// Writing the archive failed
    #[error("failed to write archive {path}: {reason}")]
    WriteFailed {
        /// The destination archive path
        path: PathBuf,
        /// Why the write failed
        reason: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_found",
///     "message": "job 1b0a... not found",
///     "details": {
///       "job_id": "1b0a..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Job(JobError::NotReady { .. }) => 400,
            Error::Fetch(FetchError::InvalidQuality { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Job(JobError::NotFound { .. }) => 404,

            // 422 Unprocessable Entity - job-level failures surfaced over the API
            Error::Job(JobError::AllTracksFailed { .. }) => 422,
            Error::Job(JobError::Cancelled { .. }) => 422,
            Error::Fetch(FetchError::InvalidMetadata { .. }) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
            Error::Fetch(FetchError::ToolFailed { .. }) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::Fetch(FetchError::ToolNotFound { .. }) => 503,
            Error::Fetch(FetchError::Invocation { .. }) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Job(e) => match e {
                JobError::NotFound { .. } => "job_not_found",
                JobError::NotReady { .. } => "job_not_ready",
                JobError::AllTracksFailed { .. } => "all_tracks_failed",
                JobError::Cancelled { .. } => "job_cancelled",
            },
            Error::Fetch(e) => match e {
                FetchError::ToolNotFound { .. } => "fetch_tool_not_found",
                FetchError::Invocation { .. } => "fetch_tool_error",
                FetchError::ToolFailed { .. } => "fetch_failed",
                FetchError::InvalidQuality { .. } => "invalid_quality",
                FetchError::InvalidMetadata { .. } => "invalid_metadata",
            },
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Job(JobError::NotFound { id }) => Some(serde_json::json!({
                "job_id": id,
            })),
            Error::Job(JobError::NotReady { id, phase }) => Some(serde_json::json!({
                "job_id": id,
                "phase": phase,
            })),
            Error::Job(JobError::AllTracksFailed { id, failed }) => Some(serde_json::json!({
                "job_id": id,
                "failed_tracks": failed,
            })),
            Error::Fetch(FetchError::InvalidQuality { requested, max }) => {
                Some(serde_json::json!({
                    "requested": requested,
                    "max": max,
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
