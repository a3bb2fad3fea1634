//! Archive handling for downloaded file bundles
//!
//! The remote service packages multi-file downloads as zip archives; this
//! module lists, extracts and converts them into a remote inventory.

use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::{Result, SyncError};
use crate::models::FileEntry;
use crate::services::blob_hash;

/// List the file paths contained in a zip archive
pub fn list_zip_entries(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = open_archive(bytes)?;
    let mut paths = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive
            .by_index(index)
            .map_err(|err| invalid_archive(&err))?;
        if !file.is_dir() {
            paths.push(file.name().to_string());
        }
    }
    Ok(paths)
}

/// Extract a zip archive under `dest`, returning the written relative paths.
///
/// Entries whose names escape the destination directory are skipped.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<Vec<String>> {
    let mut archive = open_archive(bytes)?;
    let mut written = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|err| invalid_archive(&err))?;

        let Some(relative) = file.enclosed_name() else {
            tracing::warn!(name = file.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let target = dest.join(&relative);

        if file.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        std::fs::write(&target, &content)?;
        written.push(relative.to_string_lossy().replace('\\', "/"));
    }

    Ok(written)
}

/// Build the remote file inventory from a downloaded bundle: one entry per
/// archived file, carrying its Git blob identity
pub fn entries_from_zip(bytes: &[u8]) -> Result<Vec<FileEntry>> {
    let mut archive = open_archive(bytes)?;
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .map_err(|err| invalid_archive(&err))?;

        let name = file.name().trim_end_matches('/').to_string();
        if name.is_empty() {
            continue;
        }
        if file.is_dir() {
            entries.push(FileEntry::remote(name, true, None));
            continue;
        }

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        let sha = blob_hash::compute_blob_sha_bytes(&content);
        entries.push(FileEntry::remote(name, false, Some(sha)));
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| invalid_archive(&err))
}

fn invalid_archive(err: &zip::result::ZipError) -> SyncError {
    SyncError::Unexpected(format!("invalid zip archive: {err}"))
}
