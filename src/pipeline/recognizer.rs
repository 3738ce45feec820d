//! Submission and polling of one segment's recognition job.
//!
//! Each runner invocation owns its job exclusively: submit once, then sleep
//! and poll until the backend reports a terminal state or the attempt budget
//! runs out. Sleeping goes through the `Clock` seam so tests finish instantly.

use crate::clock::Clock;
use crate::error::{Result, SegscribeError};
use crate::output::Reporter;
use crate::pipeline::types::{
    FragmentEntry, JobState, RecognitionJob, Segment, TranscriptFragment,
};
use crate::remote::speech::{RecognitionConfig, RecognitionResult, SpeechBackend};
use std::time::Duration;

/// Per-job polling budget and timestamp arithmetic parameters.
#[derive(Debug, Clone, Copy)]
pub struct RunnerSettings {
    /// Sleep between polls.
    pub poll_interval: Duration,
    /// Maximum number of polls before the job counts as timed out.
    pub max_attempts: u32,
    /// Nominal segment duration; segment i's timestamp base is i × this.
    pub segment_secs: u64,
}

/// Runs one segment's recognition job to a terminal state.
pub struct RecognitionJobRunner<'a> {
    backend: &'a dyn SpeechBackend,
    clock: &'a dyn Clock,
    config: &'a RecognitionConfig,
    settings: RunnerSettings,
    reporter: &'a dyn Reporter,
}

impl<'a> RecognitionJobRunner<'a> {
    pub fn new(
        backend: &'a dyn SpeechBackend,
        clock: &'a dyn Clock,
        config: &'a RecognitionConfig,
        settings: RunnerSettings,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
            settings,
            reporter,
        }
    }

    /// Submit the segment and poll until terminal or out of budget.
    ///
    /// A terminal success with an empty result list is a failure for this
    /// segment: a silently empty transcript would look like success.
    pub fn run(&self, segment: &Segment) -> Result<TranscriptFragment> {
        let uri = segment
            .staged_uri
            .as_deref()
            .ok_or_else(|| SegscribeError::RecognitionSubmit {
                message: format!("segment {} was never staged", segment.index),
            })?;

        let mut job = RecognitionJob::new(segment.index);
        let job_id = self.backend.submit(uri, self.config)?;
        job.mark_running(job_id.clone(), self.clock.now());
        self.reporter.progress(&format!(
            "[recognize] segment {} {} as {}",
            segment.index,
            job.state.label(),
            job_id
        ));

        for _attempt in 0..self.settings.max_attempts {
            self.clock.sleep(self.settings.poll_interval);
            let outcome = self.backend.poll(&job_id)?;
            if !outcome.done {
                continue;
            }

            if let Some(message) = outcome.error {
                job.mark_terminal(JobState::Failed);
                return Err(SegscribeError::JobFailed { message });
            }

            if outcome.results.is_empty() {
                job.mark_terminal(JobState::Failed);
                return Err(SegscribeError::JobFailed {
                    message: "completed but returned no results".to_string(),
                });
            }

            job.mark_terminal(JobState::Succeeded);
            self.reporter.progress(&format!(
                "[recognize] segment {} {}",
                segment.index,
                job.state.label()
            ));
            return Ok(self.fragment_from_results(segment.index, &outcome.results));
        }

        job.mark_terminal(JobState::TimedOut);
        Err(SegscribeError::JobTimeout {
            attempts: self.settings.max_attempts,
        })
    }

    /// Convert result blocks into absolute-timestamp entries.
    ///
    /// The top alternative of each block is used; alternatives whose text
    /// trims to empty are skipped. The entry offset is the first word's
    /// relative start when word timing is present, else 0.
    fn fragment_from_results(
        &self,
        segment_index: usize,
        results: &[RecognitionResult],
    ) -> TranscriptFragment {
        let base = segment_index as f64 * self.settings.segment_secs as f64;
        let mut fragment = TranscriptFragment::new(segment_index);

        for result in results {
            let Some(alternative) = result.alternatives.first() else {
                continue;
            };
            let text = alternative.transcript.trim();
            if text.is_empty() {
                continue;
            }
            let offset = alternative
                .words
                .first()
                .map(|w| w.start_secs)
                .unwrap_or(0.0);
            fragment.entries.push(FragmentEntry {
                absolute_secs: base + offset,
                text: text.to_string(),
            });
        }

        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::output::SilentReporter;
    use crate::remote::speech::{
        MockSpeechBackend, RecognitionAlternative, ScriptedJob, WordTiming,
    };
    use std::path::PathBuf;

    fn staged_segment(index: usize) -> Segment {
        let mut segment = Segment::new(
            index,
            PathBuf::from(format!("/tmp/segment_{index:03}.flac")),
            300,
        );
        segment.staged_uri = Some(format!("mem://bucket/temp/x_seg_{index:03}.flac"));
        segment
    }

    fn settings(max_attempts: u32) -> RunnerSettings {
        RunnerSettings {
            poll_interval: Duration::from_secs(10),
            max_attempts,
            segment_secs: 300,
        }
    }

    fn run_with(
        backend: &MockSpeechBackend,
        clock: &ManualClock,
        segment: &Segment,
        max_attempts: u32,
    ) -> Result<TranscriptFragment> {
        let config = RecognitionConfig::default();
        let reporter = SilentReporter;
        let runner =
            RecognitionJobRunner::new(backend, clock, &config, settings(max_attempts), &reporter);
        runner.run(segment)
    }

    #[test]
    fn test_success_applies_cumulative_timestamps() {
        let backend = MockSpeechBackend::new().with_job(
            "seg_002",
            ScriptedJob::transcript(&[(1.5, "first line"), (42.0, "second line")]),
        );
        let clock = ManualClock::new();
        let segment = staged_segment(2);

        let fragment = run_with(&backend, &clock, &segment, 5).unwrap();

        assert_eq!(fragment.segment_index, 2);
        assert_eq!(fragment.entries.len(), 2);
        // Base of segment 2 is 600 s with 300 s nominal segments.
        assert_eq!(fragment.entries[0].absolute_secs, 601.5);
        assert_eq!(fragment.entries[0].text, "first line");
        assert_eq!(fragment.entries[1].absolute_secs, 642.0);
    }

    #[test]
    fn test_timestamp_base_for_every_index() {
        for index in 0..8 {
            let backend = MockSpeechBackend::new()
                .with_fallback(ScriptedJob::transcript(&[(0.0, "line")]));
            let clock = ManualClock::new();
            let segment = staged_segment(index);

            let fragment = run_with(&backend, &clock, &segment, 3).unwrap();
            assert_eq!(fragment.entries[0].absolute_secs, index as f64 * 300.0);
        }
    }

    #[test]
    fn test_timeout_after_exactly_max_attempts_polls() {
        let backend = MockSpeechBackend::new().with_job("seg", ScriptedJob::never_done());
        let clock = ManualClock::new();
        let segment = staged_segment(0);

        let result = run_with(&backend, &clock, &segment, 3);

        match result {
            Err(SegscribeError::JobTimeout { attempts }) => assert_eq!(attempts, 3),
            other => panic!("Expected JobTimeout, got {:?}", other),
        }
        assert_eq!(backend.total_polls(), 3);
        assert_eq!(clock.sleep_count(), 3);
    }

    #[test]
    fn test_sleeps_before_every_poll() {
        let backend = MockSpeechBackend::new()
            .with_job("seg", ScriptedJob::transcript(&[(0.0, "ok")]).after_polls(2));
        let clock = ManualClock::new();
        let segment = staged_segment(0);

        run_with(&backend, &clock, &segment, 5).unwrap();

        assert_eq!(backend.total_polls(), 2);
        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.slept(), Duration::from_secs(20));
    }

    #[test]
    fn test_empty_terminal_success_is_job_failure() {
        let backend = MockSpeechBackend::new().with_job("seg", ScriptedJob::empty());
        let clock = ManualClock::new();
        let segment = staged_segment(0);

        let result = run_with(&backend, &clock, &segment, 3);

        match result {
            Err(SegscribeError::JobFailed { message }) => {
                assert!(message.contains("no results"), "message: {message}");
            }
            other => panic!("Expected JobFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_backend_failure_carries_message() {
        let backend =
            MockSpeechBackend::new().with_job("seg", ScriptedJob::failure("quota exceeded"));
        let clock = ManualClock::new();
        let segment = staged_segment(0);

        let result = run_with(&backend, &clock, &segment, 3);

        match result {
            Err(SegscribeError::JobFailed { message }) => assert_eq!(message, "quota exceeded"),
            other => panic!("Expected JobFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_submission_rejection_propagates() {
        let backend = MockSpeechBackend::new().with_job("seg", ScriptedJob::reject());
        let clock = ManualClock::new();
        let segment = staged_segment(0);

        let result = run_with(&backend, &clock, &segment, 3);
        assert!(matches!(
            result,
            Err(SegscribeError::RecognitionSubmit { .. })
        ));
        assert_eq!(backend.total_polls(), 0);
    }

    #[test]
    fn test_unstaged_segment_is_rejected() {
        let backend = MockSpeechBackend::new();
        let clock = ManualClock::new();
        let segment = Segment::new(0, PathBuf::from("/tmp/segment_000.flac"), 300);

        let result = run_with(&backend, &clock, &segment, 3);
        assert!(matches!(
            result,
            Err(SegscribeError::RecognitionSubmit { .. })
        ));
    }

    #[test]
    fn test_alternative_without_words_gets_zero_offset() {
        let backend = MockSpeechBackend::new();
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let reporter = SilentReporter;
        let runner = RecognitionJobRunner::new(&backend, &clock, &config, settings(3), &reporter);

        let results = vec![RecognitionResult {
            alternatives: vec![RecognitionAlternative {
                transcript: "no timing here".to_string(),
                words: Vec::new(),
            }],
        }];

        let fragment = runner.fragment_from_results(1, &results);
        assert_eq!(fragment.entries.len(), 1);
        assert_eq!(fragment.entries[0].absolute_secs, 300.0);
    }

    #[test]
    fn test_blank_alternatives_are_skipped() {
        let backend = MockSpeechBackend::new();
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let reporter = SilentReporter;
        let runner = RecognitionJobRunner::new(&backend, &clock, &config, settings(3), &reporter);

        let results = vec![
            RecognitionResult {
                alternatives: vec![RecognitionAlternative {
                    transcript: "   ".to_string(),
                    words: vec![WordTiming {
                        word: String::new(),
                        start_secs: 3.0,
                    }],
                }],
            },
            RecognitionResult {
                alternatives: Vec::new(),
            },
            RecognitionResult {
                alternatives: vec![RecognitionAlternative {
                    transcript: " kept ".to_string(),
                    words: Vec::new(),
                }],
            },
        ];

        let fragment = runner.fragment_from_results(0, &results);
        assert_eq!(fragment.entries.len(), 1);
        assert_eq!(fragment.entries[0].text, "kept");
    }
}
