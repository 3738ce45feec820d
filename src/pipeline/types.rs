//! Data types flowing through the transcription pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// A fetched source media asset.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    /// Identifier the asset was fetched by.
    pub id: String,
    /// Where the media lives locally.
    pub local_path: PathBuf,
    /// Human-readable name, used in staged object keys.
    pub display_name: String,
    /// True when `local_path` is a run-scoped temp file the pipeline must
    /// delete at cleanup; false for borrowed user files.
    pub owned: bool,
}

/// One fixed-duration slice of the full audio track.
#[derive(Debug, Clone)]
pub struct Segment {
    /// 0-based, contiguous, gap-free index.
    pub index: usize,
    /// Local path of the lossless-encoded segment file.
    pub local_path: PathBuf,
    /// Nominal duration in seconds. The last segment of a run may actually be
    /// shorter; timestamp arithmetic always uses the nominal value.
    pub duration_secs: u64,
    /// Remote URI, set once the segment has been staged.
    pub staged_uri: Option<String>,
}

impl Segment {
    pub fn new(index: usize, local_path: PathBuf, duration_secs: u64) -> Self {
        Self {
            index,
            local_path,
            duration_secs,
            staged_uri: None,
        }
    }
}

/// Lifecycle of one recognition job. One job maps to exactly one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Created, not yet submitted.
    Pending,
    /// Submitted, polling in progress.
    Running,
    /// Terminal: results received.
    Succeeded,
    /// Terminal: submission rejected or backend reported failure.
    Failed,
    /// Terminal: poll budget exhausted without a terminal state.
    TimedOut,
}

impl JobState {
    /// Whether no further polling occurs in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }

    /// Terminal state matching a segment-scoped error.
    pub fn from_error(error: &crate::error::SegscribeError) -> Self {
        match error {
            crate::error::SegscribeError::JobTimeout { .. } => JobState::TimedOut,
            _ => JobState::Failed,
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::TimedOut => "timed out",
        }
    }
}

/// Tracking record for one segment's recognition job.
#[derive(Debug, Clone)]
pub struct RecognitionJob {
    pub segment_index: usize,
    pub job_id: Option<String>,
    pub submitted_at: Option<Instant>,
    pub state: JobState,
}

impl RecognitionJob {
    pub fn new(segment_index: usize) -> Self {
        Self {
            segment_index,
            job_id: None,
            submitted_at: None,
            state: JobState::Pending,
        }
    }

    /// Record a successful submission.
    pub fn mark_running(&mut self, job_id: String, submitted_at: Instant) {
        self.job_id = Some(job_id);
        self.submitted_at = Some(submitted_at);
        self.state = JobState::Running;
    }

    /// Record the terminal state.
    pub fn mark_terminal(&mut self, state: JobState) {
        debug_assert!(state.is_terminal());
        self.state = state;
    }
}

/// One timestamped line of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentEntry {
    /// Seconds from the start of the whole source.
    pub absolute_secs: f64,
    pub text: String,
}

/// Ordered transcription output of one successfully recognized segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    pub segment_index: usize,
    pub entries: Vec<FragmentEntry>,
}

impl TranscriptFragment {
    pub fn new(segment_index: usize) -> Self {
        Self {
            segment_index,
            entries: Vec::new(),
        }
    }
}

/// Final response payload of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Wall-clock seconds the run took.
    pub elapsed_seconds: f64,
    /// URI of the staged full-length intermediate.
    pub staged_asset_uri: String,
    /// The assembled transcript, one `[HH:MM:SS] text` line per entry.
    pub transcript: String,
    /// Indices of segments whose job did not reach Succeeded.
    pub unfinished_segment_indices: Vec<usize>,
}
