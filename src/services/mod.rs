//! Service layer for LangSync
//!
//! This module contains the synchronization core: content hashing and
//! inspection, inventory comparison, and the remote repository transport.

pub mod archive;
pub mod blob_hash;
pub mod cancellation;
pub mod content_inspector;
pub mod entry_comparer;
pub mod remote_client;
pub mod route_racing;
pub mod scanner;

pub use blob_hash::{compute_blob_sha, compute_blob_sha_bytes};
pub use cancellation::{CancellationRegistry, CancellationToken};
pub use content_inspector::inspect;
pub use entry_comparer::{build_tree, merge, plan_commit_files};
pub use remote_client::RemoteRepositoryClient;
pub use route_racing::{race_first_success, RouteRacingClient};
pub use scanner::{scan_workspace, ScanOptions};
