//! Cancellation support for long-running operations

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, SyncError};

/// A token that can be used to check if an operation has been cancelled
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail fast with `SyncError::Cancelled` once the token has been cancelled
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry mapping operation ids (scan, hash batch, download, submission)
/// to their cancellation tokens so the UI can abort work by id
#[derive(Default)]
pub struct CancellationRegistry {
    tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl CancellationRegistry {
    /// Register a new operation and return its cancellation token
    pub fn register(&self, operation_id: impl Into<String>) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(operation_id.into(), token.clone());
        }
        token
    }

    /// Cancel an operation by id; returns false when the id is unknown
    pub fn cancel(&self, operation_id: &str) -> bool {
        match self.tokens.lock() {
            Ok(tokens) => match tokens.get(operation_id) {
                Some(token) => {
                    token.cancel();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Remove a finished operation from the registry
    pub fn remove(&self, operation_id: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(operation_id);
        }
    }
}
