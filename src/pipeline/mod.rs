//! The segmented transcription pipeline.
//!
//! Stage order: fetch → transcode → split → stage → recognize → assemble,
//! with a run-scoped cleanup registry drained exactly once at the end.

pub mod assembler;
pub mod cleanup;
pub mod dispatcher;
pub mod orchestrator;
pub mod recognizer;
pub mod stager;
pub mod types;

pub use assembler::{assemble, format_hms};
pub use cleanup::CleanupRegistry;
pub use dispatcher::{DispatchOutcome, run_all};
pub use orchestrator::{PipelineOrchestrator, PipelineState};
pub use recognizer::{RecognitionJobRunner, RunnerSettings};
pub use stager::SegmentStager;
pub use types::{
    FragmentEntry, JobState, RecognitionJob, RunReport, Segment, SourceAsset, TranscriptFragment,
};
