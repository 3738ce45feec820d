//! Staging of local files into remote object storage.
//!
//! Every successfully staged key goes into the cleanup registry immediately,
//! so deletion is attempted even when a later stage of the run fails.

use crate::error::{Result, SegscribeError};
use crate::output::Reporter;
use crate::pipeline::cleanup::CleanupRegistry;
use crate::remote::store::ObjectStore;
use std::path::Path;

/// Uploads run artifacts and tracks them for cleanup.
pub struct SegmentStager<'a> {
    store: &'a dyn ObjectStore,
    registry: &'a CleanupRegistry,
    reporter: &'a dyn Reporter,
}

impl<'a> SegmentStager<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        registry: &'a CleanupRegistry,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            store,
            registry,
            reporter,
        }
    }

    /// Upload `local_path` under `key` and return its URI.
    ///
    /// The key is recorded for cleanup on the first successful upload; a
    /// failure here is fatal for the run (an un-staged segment cannot be
    /// recognized).
    pub fn stage(&self, local_path: &Path, key: &str) -> Result<String> {
        let uri = self
            .store
            .put(local_path, key)
            .map_err(|e| match e {
                staging @ SegscribeError::Staging { .. } => staging,
                other => SegscribeError::Staging {
                    key: key.to_string(),
                    message: other.to_string(),
                },
            })?;
        self.registry.record_remote(key);
        Ok(uri)
    }

    /// Best-effort deletion of a staged key. Failures are logged, never
    /// raised: cleanup must not mask the primary error.
    pub fn unstage(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            self.reporter
                .warn(&format!("failed to unstage {key}: {e}"));
        }
    }
}
