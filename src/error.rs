//! Error types for LangSync

use serde::Serialize;
use thiserror::Error;

/// Classification of a failed operation, used by callers to branch on
/// outcome without inspecting message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    External,
    Unexpected,
    Cancelled,
}

/// Application error types
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote service failure: {0}")]
    External(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// The taxonomy kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::NotFound(_) => ErrorKind::NotFound,
            SyncError::Conflict(_) => ErrorKind::Conflict,
            SyncError::External(_) | SyncError::Transport(_) | SyncError::Io(_) => {
                ErrorKind::External
            }
            SyncError::Serialization(_) | SyncError::Unexpected(_) => ErrorKind::Unexpected,
            SyncError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Stable string code for logs and persisted diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "VALIDATION",
            SyncError::NotFound(_) => "NOT_FOUND",
            SyncError::Conflict(_) => "CONFLICT",
            SyncError::External(_) => "EXTERNAL",
            SyncError::Transport(_) => "TRANSPORT",
            SyncError::Io(_) => "IO_ERROR",
            SyncError::Serialization(_) => "SERIALIZATION_ERROR",
            SyncError::Unexpected(_) => "UNEXPECTED",
            SyncError::Cancelled => "CANCELLED",
        }
    }
}

/// Serializable error response for the UI boundary
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&SyncError> for ErrorResponse {
    fn from(error: &SyncError) -> Self {
        // Validation/Conflict/NotFound carry a message the user can act on;
        // everything else gets a generic lead-in with the underlying fault
        // appended, and cancellation stays neutral.
        let message = match error.kind() {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Conflict => error.to_string(),
            ErrorKind::External | ErrorKind::Unexpected => {
                format!("The operation failed: {}", error)
            }
            ErrorKind::Cancelled => "The operation was cancelled".to_string(),
        };

        ErrorResponse {
            code: error.code().to_string(),
            message,
            details: None,
        }
    }
}

impl serde::Serialize for SyncError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for LangSync operations
pub type Result<T> = std::result::Result<T, SyncError>;
