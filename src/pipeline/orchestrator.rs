//! Top-level pipeline driver.
//!
//! Sequences fetch → transcode → split → stage → recognize → assemble, and
//! owns the cleanup registry. Cleanup runs exactly once per run, on success
//! and on failure alike, and never masks the primary error.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::media::command::CommandExecutor;
use crate::media::transcoder::Transcoder;
use crate::output::{Reporter, SilentReporter};
use crate::pipeline::assembler;
use crate::pipeline::cleanup::CleanupRegistry;
use crate::pipeline::dispatcher;
use crate::pipeline::recognizer::RunnerSettings;
use crate::pipeline::stager::SegmentStager;
use crate::pipeline::types::{RunReport, Segment};
use crate::remote::speech::{RecognitionConfig, SpeechBackend};
use crate::remote::store::ObjectStore;
use crate::source::SourceFetcher;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// Stages a run moves through. Failures in any stage transition to `Failed`;
/// `Done` and `Failed` are terminal and both trigger the single cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Fetching,
    Transcoding,
    Splitting,
    Staging,
    Recognizing,
    Assembling,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Fetching => "fetch",
            PipelineState::Transcoding => "transcode",
            PipelineState::Splitting => "split",
            PipelineState::Staging => "stage",
            PipelineState::Recognizing => "recognize",
            PipelineState::Assembling => "assemble",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

/// Drives a complete transcription run from explicit dependencies.
///
/// Every collaborator is injected, so tests substitute fakes per run; there
/// is no ambient global state.
pub struct PipelineOrchestrator {
    fetcher: Box<dyn SourceFetcher>,
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn ObjectStore>,
    backend: Arc<dyn SpeechBackend>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    config: Config,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with the system clock and a silent reporter.
    pub fn new(
        fetcher: Box<dyn SourceFetcher>,
        executor: Arc<dyn CommandExecutor>,
        store: Arc<dyn ObjectStore>,
        backend: Arc<dyn SpeechBackend>,
        config: Config,
    ) -> Self {
        Self {
            fetcher,
            executor,
            store,
            backend,
            clock: Arc::new(SystemClock),
            reporter: Arc::new(SilentReporter),
            config,
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets a custom progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run the full pipeline for `source_id`.
    ///
    /// Fatal errors (fetch, transcode, staging) abort the run; per-segment
    /// recognition errors only land in `unfinished_segment_indices`. Either
    /// way, everything staged or written locally during the run is removed
    /// before this returns.
    pub fn run(&self, source_id: &str) -> Result<RunReport> {
        let started = self.clock.now();
        let registry = CleanupRegistry::new();

        let outcome = self.execute(source_id, &registry);

        // Done and Failed funnel through the same single cleanup pass.
        self.cleanup(&registry);

        match outcome {
            Ok(mut report) => {
                report.elapsed_seconds = self.clock.now().duration_since(started).as_secs_f64();
                self.reporter.progress(&format!(
                    "[{}] finished in {:.1}s, {} unfinished segments",
                    PipelineState::Done.label(),
                    report.elapsed_seconds,
                    report.unfinished_segment_indices.len()
                ));
                Ok(report)
            }
            Err(error) => {
                self.reporter
                    .warn(&format!("[{}] {error}", PipelineState::Failed.label()));
                Err(error)
            }
        }
    }

    fn execute(&self, source_id: &str, registry: &CleanupRegistry) -> Result<RunReport> {
        let mut state = PipelineState::Fetching;
        self.reporter
            .progress(&format!("[{}] resolving source {source_id}", state.label()));
        let asset = self.fetcher.fetch(source_id)?;
        if asset.owned {
            registry.record_local(&asset.local_path);
        }

        let scratch = tempfile::Builder::new()
            .prefix("segscribe-")
            .tempdir()?
            .keep();
        registry.record_local(&scratch);

        state = PipelineState::Transcoding;
        self.reporter.progress(&format!(
            "[{}] re-encoding {} to audio intermediate",
            state.label(),
            asset.display_name
        ));
        let transcoder = Transcoder::new(Arc::clone(&self.executor));
        let intermediate = transcoder.to_intermediate(&asset.local_path, &scratch)?;

        state = PipelineState::Splitting;
        let segment_secs = self.config.pipeline.segment_secs;
        let split_dir = scratch.join("segments");
        fs::create_dir_all(&split_dir)?;
        let parts = transcoder.split(&intermediate, segment_secs, &split_dir)?;
        self.reporter.progress(&format!(
            "[{}] {} segments of {}s",
            state.label(),
            parts.len(),
            segment_secs
        ));

        let mut segments = Vec::with_capacity(parts.len());
        for (index, part) in parts.iter().enumerate() {
            let flac = transcoder.to_lossless(part)?;
            segments.push(Segment::new(index, flac, segment_secs));
        }

        state = PipelineState::Staging;
        self.reporter.progress(&format!(
            "[{}] uploading {} files",
            state.label(),
            segments.len() + 1
        ));
        let stager = SegmentStager::new(&*self.store, registry, &*self.reporter);
        let base_key = format!(
            "{}/{}_{}",
            self.config.staging.key_prefix, asset.id, asset.display_name
        );
        let staged_asset_uri = stager.stage(&intermediate, &format!("{base_key}.mp3"))?;
        for segment in &mut segments {
            let key = format!("{base_key}_seg_{:03}.flac", segment.index);
            let uri = stager.stage(&segment.local_path, &key)?;
            segment.staged_uri = Some(uri);
        }

        state = PipelineState::Recognizing;
        self.reporter.progress(&format!(
            "[{}] submitting {} jobs",
            state.label(),
            segments.len()
        ));
        let recognition = RecognitionConfig::from_settings(&self.config.recognition);
        let settings = RunnerSettings {
            poll_interval: Duration::from_secs(self.config.recognition.poll_interval_secs),
            max_attempts: self.config.recognition.max_attempts,
            segment_secs,
        };
        let outcome = dispatcher::run_all(
            &segments,
            &*self.backend,
            &recognition,
            &*self.clock,
            settings,
            self.config.pipeline.worker_limit,
            &*self.reporter,
        );

        state = PipelineState::Assembling;
        self.reporter.progress(&format!(
            "[{}] {} fragments, {} unfinished",
            state.label(),
            outcome.fragments.len(),
            outcome.failures.len()
        ));
        let transcript = assembler::assemble(&outcome.fragments);

        Ok(RunReport {
            // Filled in by run() once cleanup has finished.
            elapsed_seconds: 0.0,
            staged_asset_uri,
            transcript,
            unfinished_segment_indices: outcome.failures.keys().copied().collect(),
        })
    }

    /// Remove everything the run recorded: remote keys first, then local
    /// files and directories. Individual failures are logged and skipped.
    fn cleanup(&self, registry: &CleanupRegistry) {
        let (keys, paths) = registry.drain();
        if keys.is_empty() && paths.is_empty() {
            return;
        }

        self.reporter.progress(&format!(
            "[cleanup] removing {} staged objects, {} local paths",
            keys.len(),
            paths.len()
        ));

        let stager = SegmentStager::new(&*self.store, registry, &*self.reporter);
        for key in &keys {
            stager.unstage(key);
        }

        for path in &paths {
            let result = if path.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            };
            if let Err(e) = result
                && e.kind() != std::io::ErrorKind::NotFound
            {
                self.reporter
                    .warn(&format!("failed to remove {}: {e}", path.display()));
            }
        }
    }
}
