//! Archive packaging
//!
//! Bundles a job's scratch directory into a single ZIP whose entries all live
//! under one top-level directory, so unpacking always yields exactly one
//! folder named after the album. Compression is deflate at maximum level.
//! Any write error fails the whole operation; a partial archive is never
//! reported as success.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{ArchiveError, Error, Result};

/// Directory-to-ZIP packer
pub struct Archiver;

impl Archiver {
    /// Pack every file under `source_dir` into a ZIP at `dest_path`, with all
    /// entries nested under the single top-level directory `root_name`.
    ///
    /// Blocking: callers on the async runtime should wrap this in
    /// `spawn_blocking`.
    pub fn pack(source_dir: &Path, root_name: &str, dest_path: &Path) -> Result<()> {
        debug!(
            source = %source_dir.display(),
            dest = %dest_path.display(),
            root = root_name,
            "packing archive"
        );

        if !source_dir.is_dir() {
            return Err(Error::Archive(ArchiveError::SourceUnreadable {
                path: source_dir.to_path_buf(),
                reason: "not a directory".to_string(),
            }));
        }

        let file = File::create(dest_path).map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                path: dest_path.to_path_buf(),
                reason: format!("failed to create archive file: {e}"),
            })
        })?;

        let mut writer = zip::ZipWriter::new(file);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9));

        writer
            .add_directory(format!("{root_name}/"), options)
            .map_err(|e| {
                Error::Archive(ArchiveError::WriteFailed {
                    path: dest_path.to_path_buf(),
                    reason: format!("failed to add root directory: {e}"),
                })
            })?;

        let mut entry_count = 0usize;
        let mut buffer = Vec::new();

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Archive(ArchiveError::SourceUnreadable {
                    path: source_dir.to_path_buf(),
                    reason: e.to_string(),
                })
            })?;

            let path = entry.path();
            let relative = match path.strip_prefix(source_dir) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            let entry_name = format!("{root_name}/{}", relative.to_string_lossy());

            if entry.file_type().is_dir() {
                writer
                    .add_directory(format!("{entry_name}/"), options)
                    .map_err(|e| {
                        Error::Archive(ArchiveError::WriteFailed {
                            path: dest_path.to_path_buf(),
                            reason: format!("failed to add directory entry: {e}"),
                        })
                    })?;
                continue;
            }

            writer.start_file(&entry_name, options).map_err(|e| {
                Error::Archive(ArchiveError::WriteFailed {
                    path: dest_path.to_path_buf(),
                    reason: format!("failed to start entry {entry_name}: {e}"),
                })
            })?;

            buffer.clear();
            File::open(path)
                .and_then(|mut f| f.read_to_end(&mut buffer))
                .map_err(|e| {
                    Error::Archive(ArchiveError::SourceUnreadable {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })
                })?;

            writer.write_all(&buffer).map_err(|e| {
                Error::Archive(ArchiveError::WriteFailed {
                    path: dest_path.to_path_buf(),
                    reason: format!("failed to write entry {entry_name}: {e}"),
                })
            })?;

            entry_count += 1;
        }

        // finish() flushes the central directory; an error here means the
        // archive on disk is incomplete and must not be treated as done
        let mut file = writer.finish().map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                path: dest_path.to_path_buf(),
                reason: format!("failed to finalize archive: {e}"),
            })
        })?;
        file.flush().map_err(|e| {
            Error::Archive(ArchiveError::WriteFailed {
                path: dest_path.to_path_buf(),
                reason: format!("failed to flush archive: {e}"),
            })
        })?;

        info!(
            dest = %dest_path.display(),
            entries = entry_count,
            "archive packed"
        );
        Ok(())
    }
}
