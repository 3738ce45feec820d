//! Error types for segscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegscribeError {
    // Source retrieval errors (fatal)
    #[error("Source not found: {id}")]
    SourceNotFound { id: String },

    #[error("Failed to fetch source {id}: {message}")]
    Fetch { id: String, message: String },

    // Transcoding errors (fatal)
    #[error("Media tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("Transcode failed: {message}")]
    Transcode { message: String },

    // Staging errors (fatal)
    #[error("Failed to stage {key}: {message}")]
    Staging { key: String, message: String },

    // Recognition errors (scoped to a single segment)
    #[error("Recognition submission rejected: {message}")]
    RecognitionSubmit { message: String },

    #[error("Recognition job failed: {message}")]
    JobFailed { message: String },

    #[error("Recognition job not terminal after {attempts} poll attempts")]
    JobTimeout { attempts: u32 },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SegscribeError {
    /// Whether this error is scoped to a single segment's recognition job.
    ///
    /// Segment-scoped errors are recorded as unfinished segments and do not
    /// abort the run; everything else is fatal to the whole pipeline.
    pub fn is_segment_scoped(&self) -> bool {
        matches!(
            self,
            SegscribeError::RecognitionSubmit { .. }
                | SegscribeError::JobFailed { .. }
                | SegscribeError::JobTimeout { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SegscribeError>;
