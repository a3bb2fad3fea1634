//! Pull request models for the remote repository service

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::entry::FileOperation;

/// One file operation in a pull request payload
///
/// `content` is base64-encoded file bytes, required for upserts and absent
/// for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestFile {
    pub operation: FileOperation,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PullRequestFile {
    /// An upsert carrying the file's bytes, base64-encoded for binary safety
    pub fn upsert(path: impl Into<String>, content: &[u8]) -> Self {
        Self {
            operation: FileOperation::Upsert,
            path: path.into(),
            content: Some(BASE64.encode(content)),
        }
    }

    /// A delete; carries no content
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            operation: FileOperation::Delete,
            path: path.into(),
            content: None,
        }
    }
}

/// A batched pull request submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRequest {
    pub branch_name: String,
    pub commit_message: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub files: Vec<PullRequestFile>,
}

/// One result entry reported by the remote for a pull request submission
///
/// The remote may report several entries for a single submission (e.g. a
/// branch push plus the pull request itself), so all fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEntry {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub pr_number: Option<u64>,
    #[serde(default)]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Outcome of a pull request submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub entries: Vec<PullRequestEntry>,
}
