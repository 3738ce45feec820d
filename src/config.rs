use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub staging: StagingConfig,
    pub recognition: RecognitionSettings,
    pub pipeline: PipelineSettings,
}

/// Remote object-storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StagingConfig {
    /// Bucket staged blobs are written to.
    pub bucket: String,
    /// Object-key prefix for everything staged by a run.
    pub key_prefix: String,
    /// Base URL of the object API (metadata + delete).
    pub endpoint: String,
    /// Base URL of the media-upload API.
    pub upload_endpoint: String,
}

/// Speech-recognition backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Language code sent with every recognition request.
    pub language: String,
    /// Base URL of the recognition API.
    pub endpoint: String,
    /// Seconds between status polls of a submitted job.
    pub poll_interval_secs: u64,
    /// Maximum number of polls before a job counts as timed out.
    pub max_attempts: u32,
}

/// Segmentation and dispatch tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Nominal segment duration in seconds; the last segment may be shorter.
    pub segment_secs: u64,
    /// Maximum number of concurrent recognition workers.
    pub worker_limit: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            bucket: "segscribe-staging".to_string(),
            key_prefix: defaults::KEY_PREFIX.to_string(),
            endpoint: "https://storage.googleapis.com/storage/v1".to_string(),
            upload_endpoint: "https://storage.googleapis.com/upload/storage/v1".to_string(),
        }
    }
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            endpoint: "https://speech.googleapis.com/v1".to_string(),
            poll_interval_secs: defaults::POLL_INTERVAL_SECONDS,
            max_attempts: defaults::MAX_POLL_ATTEMPTS,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            segment_secs: defaults::SEGMENT_SECONDS,
            worker_limit: defaults::WORKER_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    // Re-panic on invalid TOML or other errors
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SEGSCRIBE_BUCKET → staging.bucket
    /// - SEGSCRIBE_LANGUAGE → recognition.language
    /// - SEGSCRIBE_SPEECH_ENDPOINT → recognition.endpoint
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bucket) = std::env::var("SEGSCRIBE_BUCKET")
            && !bucket.is_empty()
        {
            self.staging.bucket = bucket;
        }

        if let Ok(language) = std::env::var("SEGSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.language = language;
        }

        if let Ok(endpoint) = std::env::var("SEGSCRIBE_SPEECH_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.recognition.endpoint = endpoint;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/segscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("segscribe")
            .join("config.toml")
    }
}
