//! Local workspace scanning
//!
//! Walks a translation workspace and produces the local file inventory:
//! one entry per directory and per matching file, each file annotated with
//! its Git blob identity.

use std::path::{Path, PathBuf};

use glob::Pattern;
use once_cell::sync::Lazy;

use crate::error::{Result, SyncError};
use crate::models::FileEntry;
use crate::services::blob_hash;
use crate::services::cancellation::CancellationToken;

static DEFAULT_EXCLUDES: Lazy<Vec<Pattern>> = Lazy::new(|| {
    [".git", ".git/**", "**/.git", "**/.git/**"]
        .iter()
        .map(|raw| Pattern::new(raw).expect("default exclude pattern"))
        .collect()
});

/// Include/exclude globs matched against repository-relative paths
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// When non-empty, only files matching at least one pattern are recorded
    pub include: Vec<String>,
    /// Paths matching any pattern are skipped; directories are pruned
    pub exclude: Vec<String>,
}

struct ScanMatcher {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ScanMatcher {
    fn compile(options: &ScanOptions) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(&options.include)?,
            exclude: compile_patterns(&options.exclude)?,
        })
    }

    fn is_excluded(&self, relative: &str) -> bool {
        DEFAULT_EXCLUDES
            .iter()
            .chain(self.exclude.iter())
            .any(|pattern| pattern.matches(relative))
    }

    fn is_included(&self, relative: &str) -> bool {
        self.include.is_empty() || self.include.iter().any(|pattern| pattern.matches(relative))
    }
}

fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
    raw.iter()
        .map(|pattern| {
            Pattern::new(pattern)
                .map_err(|err| SyncError::Validation(format!("invalid glob '{pattern}': {err}")))
        })
        .collect()
}

/// Scan a workspace directory into a path-sorted local inventory.
///
/// Unreadable files end up with an unknown identity (`local_sha = None`)
/// rather than failing the scan; cancellation aborts between entries and
/// inside each hash computation.
pub async fn scan_workspace(
    root: &Path,
    options: &ScanOptions,
    token: &CancellationToken,
) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(SyncError::Validation(format!(
            "scan root is not a directory: {}",
            root.display()
        )));
    }
    let matcher = ScanMatcher::compile(options)?;

    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut entries: Vec<FileEntry> = Vec::new();

    while let Some(dir) = pending.pop() {
        token.ensure_active()?;

        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };

        loop {
            let item = match read_dir.next_entry().await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(path = %dir.display(), error = %err, "directory listing aborted");
                    break;
                }
            };

            let path = item.path();
            let Some(relative) = relative_key(root, &path) else {
                continue;
            };
            let file_type = match item.file_type().await {
                Ok(file_type) => file_type,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if file_type.is_dir() {
                if matcher.is_excluded(&relative) {
                    continue;
                }
                entries.push(FileEntry::local(relative, true, None));
                pending.push(path);
            } else if file_type.is_file() {
                if matcher.is_excluded(&relative) || !matcher.is_included(&relative) {
                    continue;
                }
                let sha = blob_hash::compute_blob_sha(&path, token).await?;
                entries.push(FileEntry::local(relative, false, sha));
            }
            // Symlinks are not followed
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Repository-relative key with forward slashes
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let key = relative.to_string_lossy().replace('\\', "/");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
