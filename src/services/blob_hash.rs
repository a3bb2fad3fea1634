//! Git-blob-compatible content hashing
//!
//! Produces the same digest as `git hash-object`: SHA-1 over
//! `"blob " + <decimal byte length> + NUL + <contents>`.

use std::path::Path;
use std::time::Duration;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::error::{Result, SyncError};
use crate::services::cancellation::CancellationToken;

/// Read size chosen to bound memory for large files
const CHUNK_SIZE: usize = 128 * 1024;

/// Files can be held by antivirus scanners or concurrent writers; retry
/// before giving up
const LOCK_RETRY_ATTEMPTS: u32 = 10;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Compute the Git blob SHA-1 of a file, lowercase hex.
///
/// Returns `Ok(None)` when the digest cannot be produced (file locked for
/// the whole retry window, unreadable, or changed length mid-read) — callers
/// treat that as "identity unknown", not as a failure. Cancellation is the
/// only error surfaced.
pub async fn compute_blob_sha(
    path: &Path,
    token: &CancellationToken,
) -> Result<Option<String>> {
    for attempt in 1..=LOCK_RETRY_ATTEMPTS {
        token.ensure_active()?;

        match hash_file(path, token).await {
            Ok(digest) => return Ok(digest),
            Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
            Err(SyncError::Io(err)) if is_transient_lock(&err) => {
                if attempt == LOCK_RETRY_ATTEMPTS {
                    tracing::warn!(
                        path = %path.display(),
                        "file still locked after {} attempts, treating identity as unknown",
                        LOCK_RETRY_ATTEMPTS
                    );
                    return Ok(None);
                }
                tokio::time::sleep(LOCK_RETRY_DELAY).await;
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "hashing failed");
                return Ok(None);
            }
        }
    }

    Ok(None)
}

/// Compute the Git blob SHA-1 of an in-memory buffer, lowercase hex
pub fn compute_blob_sha_bytes(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    hex::encode(hasher.finalize())
}

async fn hash_file(path: &Path, token: &CancellationToken) -> Result<Option<String>> {
    let mut file = tokio::fs::File::open(path).await?;

    // The header length comes from the handle we are about to read; the byte
    // count actually read must match it or the digest would be wrong.
    let expected_len = file.metadata().await?.len();

    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", expected_len).as_bytes());

    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut read_total: u64 = 0;
    loop {
        token.ensure_active()?;
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        read_total += n as u64;
        if read_total > expected_len {
            // File grew under us
            return Ok(None);
        }
        hasher.update(&buf[..n]);
    }

    if read_total != expected_len {
        // File shrank under us
        return Ok(None);
    }

    Ok(Some(hex::encode(hasher.finalize())))
}

/// Lock-shaped failures worth retrying; anything else is a hard miss
fn is_transient_lock(err: &std::io::Error) -> bool {
    if matches!(
        err.kind(),
        std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    // Windows sharing violations (ERROR_SHARING_VIOLATION / ERROR_LOCK_VIOLATION)
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::TestWorkspace;

    #[tokio::test]
    async fn test_empty_file_matches_git() {
        let ws = TestWorkspace::new();
        ws.create_file("empty.resx", "");

        let sha = compute_blob_sha(&ws.path.join("empty.resx"), &CancellationToken::new())
            .await
            .unwrap();
        // printf '' | git hash-object --stdin
        assert_eq!(
            sha.as_deref(),
            Some("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391")
        );
    }

    #[tokio::test]
    async fn test_known_content_matches_git() {
        let ws = TestWorkspace::new();
        ws.create_file("hello.txt", "hello");

        let sha = compute_blob_sha(&ws.path.join("hello.txt"), &CancellationToken::new())
            .await
            .unwrap();
        // printf 'hello' | git hash-object --stdin
        assert_eq!(
            sha.as_deref(),
            Some("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0")
        );
    }

    #[tokio::test]
    async fn test_chunked_read_matches_single_buffer() {
        let ws = TestWorkspace::new();
        let content: Vec<u8> = (0..300 * 1024).map(|i| (i % 251) as u8).collect();
        ws.create_binary_file("big.bin", &content);

        let sha = compute_blob_sha(&ws.path.join("big.bin"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(sha, Some(compute_blob_sha_bytes(&content)));
    }

    #[tokio::test]
    async fn test_missing_file_is_unknown_not_error() {
        let ws = TestWorkspace::new();
        let sha = compute_blob_sha(&ws.path.join("nope.txt"), &CancellationToken::new()).await;
        assert!(matches!(sha, Ok(None)));
    }

    #[tokio::test]
    async fn test_cancellation_is_surfaced() {
        let ws = TestWorkspace::new();
        ws.create_file("a.txt", "content");

        let token = CancellationToken::new();
        token.cancel();
        let err = compute_blob_sha(&ws.path.join("a.txt"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_bytes_digest_matches_git() {
        assert_eq!(
            compute_blob_sha_bytes(b"hello"),
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0"
        );
        assert_eq!(
            compute_blob_sha_bytes(b""),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
    }

    #[test]
    fn test_transient_lock_detection() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        assert!(is_transient_lock(&denied));

        let sharing = std::io::Error::from_raw_os_error(32);
        assert!(is_transient_lock(&sharing));

        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!is_transient_lock(&missing));
    }
}
