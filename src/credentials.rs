//! Credential staging
//!
//! EAP-TLS material arrives as raw bytes over the control interface, but
//! wpa_supplicant only accepts file paths. Each blob is written to a uniquely
//! named file with owner-only permissions under a scratch directory, and the
//! path is recorded so the file can be removed at daemon shutdown.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Dot1xError, Dot1xResult};

/// Stages credential blobs as files and tracks them for cleanup
pub struct CredentialStore {
    /// Directory staged files are written into
    scratch_dir: PathBuf,
    /// Paths of every file staged so far, in staging order
    staged: Mutex<Vec<PathBuf>>,
    /// Process-wide sequence; keeps names unique under concurrent staging
    seq: AtomicU64,
}

impl CredentialStore {
    /// Create a store writing into `scratch_dir`
    pub fn new<P: Into<PathBuf>>(scratch_dir: P) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            staged: Mutex::new(Vec::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Write `content` to a new uniquely named file ending in `suffix`
    /// (e.g. "ca.pem"), mode 0600, and record the path for cleanup.
    ///
    /// Failures here are systemic: a partially staged credential set means
    /// the whole configure attempt must be aborted.
    pub async fn stage(&self, content: &[u8], suffix: &str) -> Dot1xResult<PathBuf> {
        let path = self.unique_path(suffix);

        let mut file = open_owner_only(&path).await.map_err(|e| {
            Dot1xError::Staging(format!("failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(content).await.map_err(|e| {
            Dot1xError::Staging(format!("failed to write {}: {}", path.display(), e))
        })?;
        file.flush().await.map_err(|e| {
            Dot1xError::Staging(format!("failed to flush {}: {}", path.display(), e))
        })?;

        debug!("Staged {} ({} bytes) at {}", suffix, content.len(), path.display());

        self.staged.lock().await.push(path.clone());
        Ok(path)
    }

    /// Paths of all staged files, in staging order
    pub async fn staged_paths(&self) -> Vec<PathBuf> {
        self.staged.lock().await.clone()
    }

    /// Remove every staged file, best-effort, and clear the set.
    /// Removal errors are logged and otherwise ignored so shutdown always
    /// makes forward progress.
    pub async fn cleanup(&self) {
        let mut staged = self.staged.lock().await;
        for path in staged.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Failed to remove staged file {}: {}", path.display(), e);
            } else {
                debug!("Removed staged file {}", path.display());
            }
        }
    }

    /// Build a path unique per call: nanosecond timestamp plus a
    /// monotonically increasing sequence plus the semantic suffix.
    fn unique_path(&self, suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir.join(format!("{}_{}_{}", nanos, seq, suffix))
    }
}

/// Open a new file readable and writable by the owner only
async fn open_owner_only(path: &Path) -> std::io::Result<tokio::fs::File> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let path = store.stage(b"CA CERT", "ca.pem").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"CA CERT");
        assert!(path.to_string_lossy().ends_with("ca.pem"));
    }

    #[tokio::test]
    async fn test_stage_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let a = store.stage(b"one", "key.pem").await.unwrap();
        let b = store.stage(b"two", "key.pem").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.staged_paths().await.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stage_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let path = store.stage(b"secret", "key.pem").await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let a = store.stage(b"one", "ca.pem").await.unwrap();
        let b = store.stage(b"two", "client.pem").await.unwrap();
        store.cleanup().await;

        assert!(!a.exists());
        assert!(!b.exists());
        assert!(store.staged_paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let a = store.stage(b"one", "ca.pem").await.unwrap();
        std::fs::remove_file(&a).unwrap();

        // Must not panic or error
        store.cleanup().await;
        assert!(store.staged_paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_stage_fails_on_missing_directory() {
        let store = CredentialStore::new("/nonexistent/dot1x-scratch");
        let err = store.stage(b"data", "ca.pem").await.unwrap_err();
        assert!(matches!(err, Dot1xError::Staging(_)));
    }

    #[tokio::test]
    async fn test_concurrent_staging_is_collision_free() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(CredentialStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.stage(format!("blob {}", i).as_bytes(), "ca.pem").await
            }));
        }

        let mut paths = std::collections::HashSet::new();
        for handle in handles {
            let path = handle.await.unwrap().unwrap();
            assert!(paths.insert(path));
        }
        assert_eq!(paths.len(), 16);
    }
}
