//! Source asset retrieval.
//!
//! Remote file-store access is out of scope; the pipeline only sees the
//! `SourceFetcher` seam. The CLI works on local files, tests inject mocks.

use crate::error::{Result, SegscribeError};
use crate::pipeline::types::SourceAsset;
use std::path::PathBuf;

/// Trait for resolving a source identifier to a local media file.
pub trait SourceFetcher: Send + Sync {
    /// Resolve `source_id` to a local asset.
    fn fetch(&self, source_id: &str) -> Result<SourceAsset>;
}

/// Fetcher that treats the source identifier as a local filesystem path.
///
/// The returned asset is borrowed: the pipeline must not delete the user's
/// file at cleanup.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSourceFetcher;

impl LocalSourceFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl SourceFetcher for LocalSourceFetcher {
    fn fetch(&self, source_id: &str) -> Result<SourceAsset> {
        let path = PathBuf::from(source_id);
        if !path.is_file() {
            return Err(SegscribeError::SourceNotFound {
                id: source_id.to_string(),
            });
        }

        let display_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source")
            .to_string();

        Ok(SourceAsset {
            id: display_name.clone(),
            local_path: path,
            display_name,
            owned: false,
        })
    }
}

/// Mock fetcher for testing.
#[derive(Debug, Clone, Default)]
pub struct MockSourceFetcher {
    path: Option<PathBuf>,
    owned: bool,
}

impl MockSourceFetcher {
    /// Fetcher that serves `path` as a borrowed asset.
    pub fn serving(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            owned: false,
        }
    }

    /// Mark the served asset as run-owned, like a freshly downloaded temp
    /// file: cleanup must delete it.
    pub fn owned(mut self) -> Self {
        self.owned = true;
        self
    }

    /// Fetcher that fails every lookup.
    pub fn not_found() -> Self {
        Self::default()
    }
}

impl SourceFetcher for MockSourceFetcher {
    fn fetch(&self, source_id: &str) -> Result<SourceAsset> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| SegscribeError::SourceNotFound {
                id: source_id.to_string(),
            })?;

        let display_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source")
            .to_string();

        Ok(SourceAsset {
            id: source_id.to_string(),
            local_path: path,
            display_name,
            owned: self.owned,
        })
    }
}
