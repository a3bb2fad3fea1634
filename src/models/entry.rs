//! File inventory models shared by the scanner, comparer and remote client

use serde::{Deserialize, Serialize};

/// Sync status of a path relative to the local and remote inventories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeType {
    #[default]
    Unchanged,
    RepoOnly,
    LocalOnly,
    Modified,
}

/// One file or directory known locally and/or remotely
///
/// The repository-relative `path` is the sole join key across inventories.
/// SHA fields hold Git blob identities in lowercase hex; `None` means the
/// path is absent (or unreadable) on that side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub local_sha: Option<String>,
    #[serde(default)]
    pub repo_sha: Option<String>,
    #[serde(default)]
    pub change_type: ChangeType,
}

impl FileEntry {
    /// An entry known from the local workspace scan
    pub fn local(path: impl Into<String>, is_directory: bool, local_sha: Option<String>) -> Self {
        let mut entry = Self {
            path: path.into(),
            is_directory,
            local_sha,
            repo_sha: None,
            change_type: ChangeType::Unchanged,
        };
        entry.refresh_change_type();
        entry
    }

    /// An entry known from the remote repository listing
    pub fn remote(path: impl Into<String>, is_directory: bool, repo_sha: Option<String>) -> Self {
        let mut entry = Self {
            path: path.into(),
            is_directory,
            local_sha: None,
            repo_sha,
            change_type: ChangeType::Unchanged,
        };
        entry.refresh_change_type();
        entry
    }

    /// Recompute `change_type` from the current SHA pair
    pub fn refresh_change_type(&mut self) {
        self.change_type = match (&self.local_sha, &self.repo_sha) {
            (Some(local), Some(repo)) if local == repo => ChangeType::Unchanged,
            (Some(_), Some(_)) => ChangeType::Modified,
            (Some(_), None) => ChangeType::LocalOnly,
            (None, Some(_)) => ChangeType::RepoOnly,
            // Directories carry no content identity on either side
            (None, None) => ChangeType::Unchanged,
        };
    }
}

/// The kind of file operation submitted in a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Upsert,
    Delete,
}

/// One file operation destined for a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitFile {
    pub operation: FileOperation,
    /// Absolute path of the file in the local workspace
    pub local_path: String,
    /// Repository-relative path
    pub repo_path: String,
}

/// A node in the display tree derived from the flat entry set
///
/// `change_type` is `None` for intermediate directories that exist only as
/// path prefixes of deeper entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryNode {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    pub change_type: Option<ChangeType>,
    pub children: Vec<EntryNode>,
}
