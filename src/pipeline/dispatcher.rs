//! Bounded-parallelism dispatch of recognition jobs.
//!
//! One worker per pool slot pulls segments off a shared channel and runs each
//! job to completion or failure. A failed segment never cancels its siblings;
//! the dispatcher always returns the full set of outcomes, re-sorted by
//! segment index so completion order never leaks into the transcript.

use crate::clock::Clock;
use crate::error::SegscribeError;
use crate::output::Reporter;
use crate::pipeline::recognizer::{RecognitionJobRunner, RunnerSettings};
use crate::pipeline::types::{JobState, Segment, TranscriptFragment};
use crate::remote::speech::{RecognitionConfig, SpeechBackend};
use std::collections::BTreeMap;
use std::thread;

/// Everything the recognition stage produced.
pub struct DispatchOutcome {
    /// Fragments of all succeeded segments, sorted by segment index.
    pub fragments: Vec<TranscriptFragment>,
    /// Per-segment errors of everything that did not succeed.
    pub failures: BTreeMap<usize, SegscribeError>,
}

/// Run every segment's recognition job under at most `worker_limit`
/// concurrent workers and collect all outcomes.
pub fn run_all(
    segments: &[Segment],
    backend: &dyn SpeechBackend,
    config: &RecognitionConfig,
    clock: &dyn Clock,
    settings: RunnerSettings,
    worker_limit: usize,
    reporter: &dyn Reporter,
) -> DispatchOutcome {
    let mut fragments = Vec::new();
    let mut failures = BTreeMap::new();

    if segments.is_empty() {
        return DispatchOutcome {
            fragments,
            failures,
        };
    }

    let worker_count = worker_limit.max(1).min(segments.len());
    reporter.progress(&format!(
        "[recognize] dispatching {} segments across {} workers",
        segments.len(),
        worker_count
    ));

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<&Segment>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    for segment in segments {
        job_tx.send(segment).expect("job channel open");
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                let runner =
                    RecognitionJobRunner::new(backend, clock, config, settings, reporter);
                for segment in job_rx.iter() {
                    let outcome = runner.run(segment);
                    result_tx.send((segment.index, outcome)).ok();
                }
            });
        }
        drop(result_tx);
    });

    // All workers have exited, so the result channel is closed and drains
    // completely here, in whatever order jobs finished.
    for (index, outcome) in result_rx.iter() {
        match outcome {
            Ok(fragment) => fragments.push(fragment),
            Err(error) => {
                reporter.warn(&format!(
                    "segment {index} {}: {error}",
                    JobState::from_error(&error).label()
                ));
                failures.insert(index, error);
            }
        }
    }

    fragments.sort_by_key(|fragment| fragment.segment_index);

    DispatchOutcome {
        fragments,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::output::{CapturingReporter, SilentReporter};
    use crate::remote::speech::{MockSpeechBackend, PollOutcome, ScriptedJob};
    use std::path::PathBuf;
    use std::time::Duration;

    fn staged_segments(count: usize) -> Vec<Segment> {
        (0..count)
            .map(|index| {
                let mut segment = Segment::new(
                    index,
                    PathBuf::from(format!("/tmp/segment_{index:03}.flac")),
                    300,
                );
                segment.staged_uri = Some(format!("mem://bucket/temp/x_seg_{index:03}.flac"));
                segment
            })
            .collect()
    }

    fn settings(max_attempts: u32) -> RunnerSettings {
        RunnerSettings {
            poll_interval: Duration::from_secs(10),
            max_attempts,
            segment_secs: 300,
        }
    }

    #[test]
    fn test_all_segments_succeed_in_index_order() {
        let backend = MockSpeechBackend::new()
            .with_job("seg_000", ScriptedJob::transcript(&[(0.0, "a")]).after_polls(3))
            .with_job("seg_001", ScriptedJob::transcript(&[(0.0, "b")]).after_polls(2))
            .with_job("seg_002", ScriptedJob::transcript(&[(0.0, "c")]));
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let segments = staged_segments(3);

        let outcome = run_all(
            &segments,
            &backend,
            &config,
            &clock,
            settings(5),
            2,
            &SilentReporter,
        );

        assert!(outcome.failures.is_empty());
        let order: Vec<usize> = outcome
            .fragments
            .iter()
            .map(|f| f.segment_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(outcome.fragments[1].entries[0].text, "b");
    }

    #[test]
    fn test_partial_failure_keeps_siblings() {
        let backend = MockSpeechBackend::new()
            .with_job("seg_000", ScriptedJob::transcript(&[(0.0, "a")]))
            .with_job("seg_001", ScriptedJob::never_done())
            .with_job("seg_002", ScriptedJob::transcript(&[(0.0, "c")]));
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let segments = staged_segments(3);

        let outcome = run_all(
            &segments,
            &backend,
            &config,
            &clock,
            settings(3),
            5,
            &SilentReporter,
        );

        let order: Vec<usize> = outcome
            .fragments
            .iter()
            .map(|f| f.segment_index)
            .collect();
        assert_eq!(order, vec![0, 2]);
        let failed: Vec<usize> = outcome.failures.keys().copied().collect();
        assert_eq!(failed, vec![1]);
        assert!(matches!(
            outcome.failures[&1],
            SegscribeError::JobTimeout { attempts: 3 }
        ));
    }

    #[test]
    fn test_failures_are_warned() {
        let backend = MockSpeechBackend::new()
            .with_job("seg_000", ScriptedJob::failure("broken"))
            .with_fallback(ScriptedJob::transcript(&[(0.0, "ok")]));
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let segments = staged_segments(2);
        let reporter = CapturingReporter::new();

        run_all(
            &segments,
            &backend,
            &config,
            &clock,
            settings(2),
            2,
            &reporter,
        );

        let warnings = reporter.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("segment 0"));
        assert!(warnings[0].contains("failed"));
    }

    #[test]
    fn test_empty_segment_list() {
        let backend = MockSpeechBackend::new();
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();

        let outcome = run_all(
            &[],
            &backend,
            &config,
            &clock,
            settings(1),
            5,
            &SilentReporter,
        );

        assert!(outcome.fragments.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_single_worker_processes_everything() {
        let backend =
            MockSpeechBackend::new().with_fallback(ScriptedJob::transcript(&[(0.0, "line")]));
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let segments = staged_segments(6);

        let outcome = run_all(
            &segments,
            &backend,
            &config,
            &clock,
            settings(2),
            1,
            &SilentReporter,
        );

        assert_eq!(outcome.fragments.len(), 6);
        assert_eq!(backend.submitted_jobs(), 6);
    }

    #[test]
    fn test_worker_pool_is_bounded() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        /// Backend that measures how many jobs are in flight at once.
        struct GaugeBackend {
            current: AtomicUsize,
            max_seen: AtomicUsize,
        }

        impl SpeechBackend for GaugeBackend {
            fn submit(
                &self,
                _audio_uri: &str,
                _config: &RecognitionConfig,
            ) -> crate::error::Result<String> {
                let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(now, Ordering::SeqCst);
                // Hold the slot briefly so overlapping workers overlap here.
                std::thread::sleep(Duration::from_millis(20));
                Ok("job".to_string())
            }

            fn poll(&self, _job_id: &str) -> crate::error::Result<PollOutcome> {
                self.current.fetch_sub(1, Ordering::SeqCst);
                Ok(PollOutcome::succeeded(vec![
                    crate::remote::speech::RecognitionResult {
                        alternatives: vec![crate::remote::speech::RecognitionAlternative {
                            transcript: "x".to_string(),
                            words: Vec::new(),
                        }],
                    },
                ]))
            }
        }

        let backend = GaugeBackend {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
        };
        let clock = ManualClock::new();
        let config = RecognitionConfig::default();
        let segments = staged_segments(8);

        let outcome = run_all(
            &segments,
            &backend,
            &config,
            &clock,
            settings(1),
            3,
            &SilentReporter,
        );

        assert_eq!(outcome.fragments.len(), 8);
        assert!(
            backend.max_seen.load(Ordering::SeqCst) <= 3,
            "worker pool exceeded its limit"
        );
    }
}
