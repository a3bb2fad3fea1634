//! LangSync - translation repository synchronization core
//!
//! Detects which local translation files differ from a remote Git-hosted
//! repository, computes Git-blob-compatible content identities, classifies
//! file content, and talks to the remote repository service over a
//! route-racing HTTP transport.

pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{ErrorKind, ErrorResponse, Result, SyncError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for binaries embedding the core
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "langsync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
