//! Core types for album-dl

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum audio quality a caller may request.
///
/// The caller's scale is "higher is better" (10 = best). The external fetch
/// tool uses the opposite convention (0 = best), so the value passed to the
/// tool is `MAX_AUDIO_QUALITY - requested`.
pub const MAX_AUDIO_QUALITY: u8 = 10;

/// Invert a caller-facing audio quality into the fetch tool's scale.
///
/// Callers must validate the input against [`MAX_AUDIO_QUALITY`] first; this
/// saturates rather than wrapping for out-of-range values.
pub fn external_audio_quality(requested: u8) -> u8 {
    MAX_AUDIO_QUALITY.saturating_sub(requested)
}

/// Unique identifier for an album job
///
/// Backed by a random UUID: jobs live only in process memory, so there is no
/// database sequence to draw from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Allocate a fresh random job id
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A single track within a submitted album
///
/// Owned exclusively by the [`Album`] that contains it and immutable once a
/// job captures it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Track {
    /// Ordinal position within the album (positive, unique, not necessarily contiguous)
    pub number: u32,

    /// Display name (may be empty; a placeholder is derived for empty names)
    #[serde(default)]
    pub name: String,

    /// Artist names, order-preserving (may be empty)
    #[serde(default)]
    pub artists: Vec<String>,

    /// Duration in seconds (informational only)
    #[serde(default)]
    pub duration_secs: Option<u32>,

    /// Source locator URL; absent or empty means "skip this track"
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Track {
    /// Name to show in progress messages and filenames.
    ///
    /// Empty names fall back to a placeholder derived from the track number.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Track {}", self.number)
        } else {
            self.name.clone()
        }
    }

    /// The track's source locator, if it has a non-empty one
    pub fn locator(&self) -> Option<&str> {
        self.source_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// A user-assembled album submitted for download
///
/// Supplied wholesale at job submission and read-only for the duration of the
/// job.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Album {
    /// Album display name (may be empty; a placeholder is derived)
    #[serde(default)]
    pub name: String,

    /// Primary artist name (may be empty; a placeholder is derived)
    #[serde(default)]
    pub artist: String,

    /// Release year
    #[serde(default)]
    pub year: Option<i32>,

    /// Cover-image URL; absent means no cover art is embedded
    #[serde(default)]
    pub cover_url: Option<String>,

    /// Ordered track list
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Album {
    /// Album name with a placeholder for empty input
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown Album"
        } else {
            &self.name
        }
    }

    /// Artist name with a placeholder for empty input
    pub fn display_artist(&self) -> &str {
        if self.artist.trim().is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        }
    }
}

/// Lifecycle phase of an album job
///
/// `done` in [`JobStatus`] is derived from this: a failed job keeps
/// `done=false`, but `phase` makes failure explicit instead of leaving the
/// client to distinguish "still running" from "never finishing".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    /// Job is still processing tracks or packaging
    #[default]
    Running,
    /// Job finished and the artifact is ready for retrieval
    Succeeded,
    /// Job hit a fatal error or was cancelled; no artifact will appear
    Failed,
}

impl JobPhase {
    /// Whether the job has reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobPhase::Running)
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobPhase::Running => "running",
            JobPhase::Succeeded => "succeeded",
            JobPhase::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of a job's progress as seen by a polling client
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatus {
    /// Job identifier
    pub id: JobId,

    /// Tracks processed so far (fetched, skipped, or failed)
    pub completed: u32,

    /// Total number of tracks, fixed at job start
    pub total: u32,

    /// Tracks whose fetch failed (soft failures; the job continued)
    pub failed: u32,

    /// Human-readable progress message
    pub status: String,

    /// Name of the track currently being processed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_track: Option<String>,

    /// Terminal error message, set only when the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Explicit lifecycle phase
    pub phase: JobPhase,

    /// Legacy completion flag; true if and only if `phase` is `succeeded`
    pub done: bool,
}

/// Metadata probed from a source locator without downloading it
///
/// Field fallbacks mirror what the fetch tool reports: a missing track title
/// falls back to the media title, a missing artist to the uploader/channel.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct TrackMetadata {
    /// Track title
    pub track: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Album name, if the source carries one
    pub album: Option<String>,

    /// Track number within the source's album
    pub track_number: Option<u32>,

    /// Duration in seconds
    pub duration_secs: Option<f64>,
}

/// Event emitted during an album job's lifecycle
///
/// Library consumers subscribe via [`crate::AlbumDownloader::subscribe`]; the
/// HTTP protocol itself stays polling-based.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted and scheduled
    JobQueued {
        /// Job identifier
        id: JobId,
        /// Number of tracks in the album
        total: u32,
    },

    /// Cover art fetched and transcoded
    CoverFetched {
        /// Job identifier
        id: JobId,
        /// Size of the transcoded JPEG in bytes
        bytes: usize,
    },

    /// Cover art was requested but could not be fetched (job continues)
    CoverUnavailable {
        /// Job identifier
        id: JobId,
    },

    /// Track fetch started
    TrackStarted {
        /// Job identifier
        id: JobId,
        /// Track display name
        track: String,
    },

    /// Track fetched and tagged
    TrackFinished {
        /// Job identifier
        id: JobId,
        /// Track display name
        track: String,
    },

    /// Track skipped because it has no source locator
    TrackSkipped {
        /// Job identifier
        id: JobId,
        /// Track display name
        track: String,
    },

    /// Track fetch failed (job continues)
    TrackFailed {
        /// Job identifier
        id: JobId,
        /// Track display name
        track: String,
        /// Failure message
        error: String,
    },

    /// Archive packaging started
    Packaging {
        /// Job identifier
        id: JobId,
    },

    /// Job finished successfully
    JobSucceeded {
        /// Job identifier
        id: JobId,
        /// Suggested artifact filename
        filename: String,
    },

    /// Job failed
    JobFailed {
        /// Job identifier
        id: JobId,
        /// Failure message
        error: String,
    },

    /// Job was cancelled
    JobCancelled {
        /// Job identifier
        id: JobId,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
