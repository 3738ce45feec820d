//! Object storage for staged audio blobs.
//!
//! The recognition backend reads segments by URI, so each one is uploaded
//! before submission and removed again during cleanup.

use crate::error::{Result, SegscribeError};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

/// Trait for remote blob storage.
///
/// This trait allows swapping implementations (real HTTP store vs in-memory).
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local_path` under `key` and return its addressable URI.
    fn put(&self, local_path: &Path, key: &str) -> Result<String>;

    /// Delete the object stored under `key`.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Object store backed by a bucket-style HTTP JSON API.
#[cfg(feature = "http-remote")]
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    bucket: String,
    endpoint: String,
    upload_endpoint: String,
    token: String,
}

#[cfg(feature = "http-remote")]
impl HttpObjectStore {
    pub fn new(staging: &crate::config::StagingConfig, token: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            bucket: staging.bucket.clone(),
            endpoint: staging.endpoint.trim_end_matches('/').to_string(),
            upload_endpoint: staging.upload_endpoint.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn staging_error(key: &str, message: impl Into<String>) -> SegscribeError {
        SegscribeError::Staging {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(feature = "http-remote")]
impl ObjectStore for HttpObjectStore {
    fn put(&self, local_path: &Path, key: &str) -> Result<String> {
        let body = std::fs::read(local_path)?;

        let mut url =
            reqwest::Url::parse(&format!("{}/b/{}/o", self.upload_endpoint, self.bucket))
                .map_err(|e| Self::staging_error(key, format!("invalid upload URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .body(body)
            .send()
            .map_err(|e| Self::staging_error(key, format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().unwrap_or_default();
            return Err(Self::staging_error(
                key,
                format!("upload rejected with {status}: {}", detail.trim()),
            ));
        }

        Ok(format!("gs://{}/{}", self.bucket, key))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut url = reqwest::Url::parse(&format!("{}/b/{}/o/", self.endpoint, self.bucket))
            .map_err(|e| Self::staging_error(key, format!("invalid delete URL: {e}")))?;
        // The object key is one path segment; slashes inside it get
        // percent-encoded by push().
        url.path_segments_mut()
            .map_err(|_| Self::staging_error(key, "endpoint cannot carry path segments"))?
            .pop_if_empty()
            .push(key);

        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| Self::staging_error(key, format!("delete request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::staging_error(
                key,
                format!("delete rejected with {}", response.status()),
            ));
        }

        Ok(())
    }
}

/// In-memory object store for tests.
///
/// Records every upload and deletion; individual keys can be scripted to fail.
#[derive(Default)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    fail_put_keys: HashSet<String>,
    fail_delete_keys: HashSet<String>,
}

impl MemoryObjectStore {
    /// Create a new in-memory store for `bucket`.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }

    /// Configure the store to reject uploads of `key`.
    pub fn with_put_failure(mut self, key: &str) -> Self {
        self.fail_put_keys.insert(key.to_string());
        self
    }

    /// Configure the store to reject deletions of `key`.
    pub fn with_delete_failure(mut self, key: &str) -> Self {
        self.fail_delete_keys.insert(key.to_string());
        self
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .expect("store poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Keys deleted so far, in deletion order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("store poisoned").clone()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().expect("store poisoned").is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put(&self, local_path: &Path, key: &str) -> Result<String> {
        if self.fail_put_keys.contains(key) {
            return Err(SegscribeError::Staging {
                key: key.to_string(),
                message: "scripted upload failure".to_string(),
            });
        }

        let bytes = std::fs::read(local_path)?;
        self.objects
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), bytes);
        Ok(format!("mem://{}/{}", self.bucket, key))
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.fail_delete_keys.contains(key) {
            return Err(SegscribeError::Staging {
                key: key.to_string(),
                message: "scripted delete failure".to_string(),
            });
        }

        self.objects.lock().expect("store poisoned").remove(key);
        self.deleted
            .lock()
            .expect("store poisoned")
            .push(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_memory_store_put_and_delete() {
        let store = MemoryObjectStore::new("meetings");
        let file = temp_file_with(b"flac data");

        let uri = store.put(file.path(), "temp/a_seg_000.flac").unwrap();
        assert_eq!(uri, "mem://meetings/temp/a_seg_000.flac");
        assert_eq!(store.keys(), vec!["temp/a_seg_000.flac"]);

        store.delete("temp/a_seg_000.flac").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.deleted(), vec!["temp/a_seg_000.flac"]);
    }

    #[test]
    fn test_memory_store_missing_local_file_errors() {
        let store = MemoryObjectStore::new("meetings");
        let result = store.put(Path::new("/nonexistent/seg.flac"), "k");
        assert!(matches!(result, Err(SegscribeError::Io(_))));
    }

    #[test]
    fn test_memory_store_scripted_put_failure() {
        let store = MemoryObjectStore::new("meetings").with_put_failure("bad-key");
        let file = temp_file_with(b"x");

        let result = store.put(file.path(), "bad-key");
        match result {
            Err(SegscribeError::Staging { key, .. }) => assert_eq!(key, "bad-key"),
            other => panic!("Expected Staging, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_store_scripted_delete_failure() {
        let store = MemoryObjectStore::new("meetings").with_delete_failure("stuck");
        let file = temp_file_with(b"x");
        store.put(file.path(), "stuck").unwrap();

        assert!(store.delete("stuck").is_err());
        assert_eq!(store.keys(), vec!["stuck"]);
    }

    #[test]
    fn test_memory_store_delete_unknown_key_is_ok() {
        let store = MemoryObjectStore::new("meetings");
        assert!(store.delete("never-uploaded").is_ok());
    }
}
