//! segscribe - Segmented media transcription
//!
//! Transcodes a source asset into fixed-duration audio segments, stages them
//! to remote object storage, fans recognition jobs out to an asynchronous
//! speech backend, and merges the results into one time-ordered transcript.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod remote;
pub mod source;

// Core seams (fetch → transcode → stage → recognize → assemble)
pub use clock::{Clock, ManualClock, SystemClock};
pub use media::command::{CommandExecutor, ScriptedCommandExecutor, SystemCommandExecutor};
pub use media::transcoder::Transcoder;
pub use remote::speech::{MockSpeechBackend, RecognitionConfig, ScriptedJob, SpeechBackend};
pub use remote::store::{MemoryObjectStore, ObjectStore};
pub use source::{LocalSourceFetcher, MockSourceFetcher, SourceFetcher};

// Pipeline
pub use pipeline::orchestrator::{PipelineOrchestrator, PipelineState};
pub use pipeline::types::{RunReport, Segment, SourceAsset, TranscriptFragment};

// Error handling
pub use error::{Result, SegscribeError};

// Config
pub use config::Config;

// Reporting
pub use output::{CapturingReporter, Reporter, SilentReporter, StderrReporter};

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
