//! Write ID3 tags onto fetched audio files
//!
//! Builds a tag from track and album attributes, embedding cover art when a
//! buffer is available. Only present, non-empty attributes are written; empty
//! strings and absent numerics are omitted rather than producing empty
//! frames. A failed write is logged and reported as `false` so the job keeps
//! the untagged file and carries on.

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Version};
use std::path::Path;

use crate::types::{Album, Track};

/// Helper: set a plain text frame only when the value is non-empty
fn set_text_opt(tag: &mut Tag, id: &str, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        tag.set_text(id, trimmed.to_string());
    }
}

/// Build the tag for a track from the attributes that are present
fn build_tag(track: &Track, album: &Album, cover: Option<&[u8]>) -> Tag {
    let mut tag = Tag::new();

    set_text_opt(&mut tag, "TIT2", &track.name);
    set_text_opt(&mut tag, "TALB", &album.name);
    set_text_opt(&mut tag, "TPE2", &album.artist);

    let artists: Vec<&str> = track
        .artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    if !artists.is_empty() {
        tag.set_text("TPE1", artists.join("; "));
    }

    if let Some(year) = album.year {
        tag.set_year(year);
    }

    if track.number > 0 {
        tag.set_text("TRCK", track.number.to_string());
    }

    if let Some(secs) = track.duration_secs
        && secs > 0
    {
        // TLEN carries the duration in milliseconds as a text frame
        tag.set_text("TLEN", (u64::from(secs) * 1000).to_string());
    }

    if let Some(data) = cover {
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: data.to_vec(),
        });
    }

    tag
}

/// Tag the audio file at `path` in place.
///
/// Returns `true` on success. Failures are logged and reported as `false`;
/// the file stays available untagged and the caller continues.
pub fn tag_track(path: &Path, track: &Track, album: &Album, cover: Option<&[u8]>) -> bool {
    let tag = build_tag(track, album, cover);

    match tag.write_to_path(path, Version::Id3v24) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Tagged track");
            true
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to write tags, keeping file untagged"
            );
            false
        }
    }
}
