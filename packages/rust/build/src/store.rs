//! In-memory output store substituting for the disk during one build cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use skeletonize_shared::{Result, SkeletonError};

/// Minimal byte store the build engine writes its output into.
pub trait OutputStore: Send + Sync {
    /// Store `bytes` at `path`, replacing any previous content.
    fn write(&self, path: &Path, bytes: Vec<u8>);

    /// Content at `path`, or `None` if nothing was written there.
    fn read(&self, path: &Path) -> Option<Vec<u8>>;
}

/// Hash-map backed [`OutputStore`]. One instance per build cycle.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an artifact as UTF-8 text.
    ///
    /// A missing path is [`SkeletonError::MissingArtifact`]; stale data from an
    /// earlier cycle can never be returned because each cycle owns its store.
    pub fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path).ok_or_else(|| SkeletonError::missing(path))?;
        String::from_utf8(bytes).map_err(|e| SkeletonError::Artifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// All written paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of `read` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputStore for MemoryStore {
    fn write(&self, path: &Path, bytes: Vec<u8>) {
        self.lock().insert(path.to_path_buf(), bytes);
    }

    fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.lock().get(path).cloned()
    }
}
