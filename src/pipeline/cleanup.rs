//! Run-scoped registry of artifacts to remove at pipeline exit.
//!
//! Staging and the coordinating thread record into the registry while workers
//! run, so all access goes through a mutex. Draining is destructive: cleanup
//! naturally executes at most once per run.

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
struct Recorded {
    remote_keys: Vec<String>,
    local_paths: Vec<PathBuf>,
}

/// Registry of everything a run has created.
#[derive(Default)]
pub struct CleanupRegistry {
    inner: Mutex<Recorded>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a staged remote key. Duplicate keys are recorded once, so a key
    /// re-staged after a retry is still deleted exactly once.
    pub fn record_remote(&self, key: &str) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        if !inner.remote_keys.iter().any(|k| k == key) {
            inner.remote_keys.push(key.to_string());
        }
    }

    /// Record a local temp file or directory.
    pub fn record_local(&self, path: &Path) {
        self.inner
            .lock()
            .expect("registry poisoned")
            .local_paths
            .push(path.to_path_buf());
    }

    /// Take everything recorded so far, leaving the registry empty.
    pub fn drain(&self) -> (Vec<String>, Vec<PathBuf>) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        let recorded = mem::take(&mut *inner);
        (recorded.remote_keys, recorded.local_paths)
    }

    /// Whether nothing is currently recorded.
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock().expect("registry poisoned");
        inner.remote_keys.is_empty() && inner.local_paths.is_empty()
    }
}
