//! Asynchronous speech-recognition backend interface.
//!
//! A job is submitted once per staged segment and then polled until it
//! reaches a terminal state. The wire protocol mirrors long-running-operation
//! APIs: submission returns an operation name, polling returns
//! `{done, error, response.results}`.

use crate::defaults;
use crate::error::{Result, SegscribeError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Encoding declared for every staged segment. The transcoder always produces
/// FLAC, so this never varies.
pub const ENCODING: &str = "FLAC";

/// Fixed recognition request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    /// BCP-47 language code, e.g. "ko-KR".
    pub language_code: String,
    /// Use the backend's enhanced model.
    pub enhanced: bool,
    /// Channel count of the staged audio.
    pub channel_count: u32,
    /// Fixed expected speaker count for diarization.
    pub diarization_speaker_count: u32,
    /// Request per-word start offsets.
    pub word_time_offsets: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language_code: defaults::DEFAULT_LANGUAGE.to_string(),
            enhanced: true,
            channel_count: defaults::CHANNEL_COUNT,
            diarization_speaker_count: defaults::DIARIZATION_SPEAKER_COUNT,
            word_time_offsets: true,
        }
    }
}

impl RecognitionConfig {
    /// Build a request config from settings, keeping the fixed fields.
    pub fn from_settings(settings: &crate::config::RecognitionSettings) -> Self {
        Self {
            language_code: settings.language.clone(),
            ..Self::default()
        }
    }
}

/// One word with its start offset relative to the segment start.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    pub word: String,
    pub start_secs: f64,
}

/// One alternative transcription of a result block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub words: Vec<WordTiming>,
}

/// One result block; the top alternative is the backend's best guess.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionResult {
    pub alternatives: Vec<RecognitionAlternative>,
}

/// Status snapshot of a submitted job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollOutcome {
    /// Whether the job reached a terminal state.
    pub done: bool,
    /// Terminal failure message reported by the backend.
    pub error: Option<String>,
    /// Result blocks, present only on terminal success.
    pub results: Vec<RecognitionResult>,
}

impl PollOutcome {
    /// Job still in flight.
    pub fn running() -> Self {
        Self::default()
    }

    /// Terminal success with `results`.
    pub fn succeeded(results: Vec<RecognitionResult>) -> Self {
        Self {
            done: true,
            error: None,
            results,
        }
    }

    /// Terminal failure with the backend's message.
    pub fn failed(message: &str) -> Self {
        Self {
            done: true,
            error: Some(message.to_string()),
            results: Vec::new(),
        }
    }
}

/// Trait for the asynchronous recognition backend.
///
/// This trait allows swapping implementations (real HTTP client vs mock).
pub trait SpeechBackend: Send + Sync {
    /// Submit `audio_uri` for recognition; returns the job identifier.
    ///
    /// A response without an identifier is a submission error.
    fn submit(&self, audio_uri: &str, config: &RecognitionConfig) -> Result<String>;

    /// Fetch the current status of a submitted job.
    fn poll(&self, job_id: &str) -> Result<PollOutcome>;
}

#[cfg(feature = "http-remote")]
mod http {
    use super::*;
    use serde::Deserialize;

    /// Recognition client speaking the long-running-operation HTTP protocol.
    pub struct HttpSpeechClient {
        client: reqwest::blocking::Client,
        endpoint: String,
        token: String,
    }

    impl HttpSpeechClient {
        pub fn new(settings: &crate::config::RecognitionSettings, token: String) -> Self {
            Self {
                client: reqwest::blocking::Client::new(),
                endpoint: settings.endpoint.trim_end_matches('/').to_string(),
                token,
            }
        }
    }

    #[derive(Deserialize)]
    struct SubmitResponse {
        name: Option<String>,
    }

    #[derive(Deserialize, Default)]
    struct OperationResponse {
        #[serde(default)]
        done: bool,
        error: Option<OperationError>,
        response: Option<RecognizeResponse>,
    }

    #[derive(Deserialize)]
    struct OperationError {
        message: Option<String>,
    }

    #[derive(Deserialize, Default)]
    struct RecognizeResponse {
        #[serde(default)]
        results: Vec<WireResult>,
    }

    #[derive(Deserialize, Default)]
    struct WireResult {
        #[serde(default)]
        alternatives: Vec<WireAlternative>,
    }

    #[derive(Deserialize, Default)]
    struct WireAlternative {
        #[serde(default)]
        transcript: String,
        #[serde(default)]
        words: Vec<WireWord>,
    }

    #[derive(Deserialize, Default)]
    #[serde(rename_all = "camelCase")]
    struct WireWord {
        #[serde(default)]
        start_time: String,
        #[serde(default)]
        word: String,
    }

    impl From<OperationResponse> for PollOutcome {
        fn from(op: OperationResponse) -> Self {
            PollOutcome {
                done: op.done,
                error: op
                    .error
                    .map(|e| e.message.unwrap_or_else(|| "Unknown error".to_string())),
                results: op
                    .response
                    .map(|r| {
                        r.results
                            .into_iter()
                            .map(|result| RecognitionResult {
                                alternatives: result
                                    .alternatives
                                    .into_iter()
                                    .map(|alt| RecognitionAlternative {
                                        transcript: alt.transcript,
                                        words: alt
                                            .words
                                            .into_iter()
                                            .map(|w| WordTiming {
                                                word: w.word,
                                                start_secs: super::parse_offset_secs(
                                                    &w.start_time,
                                                ),
                                            })
                                            .collect(),
                                    })
                                    .collect(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            }
        }
    }

    impl SpeechBackend for HttpSpeechClient {
        fn submit(&self, audio_uri: &str, config: &RecognitionConfig) -> Result<String> {
            let body = serde_json::json!({
                "config": {
                    "encoding": ENCODING,
                    "languageCode": config.language_code,
                    "useEnhanced": config.enhanced,
                    "audioChannelCount": config.channel_count,
                    "enableSpeakerDiarization": true,
                    "diarizationSpeakerCount": config.diarization_speaker_count,
                    "enableWordTimeOffsets": config.word_time_offsets,
                },
                "audio": { "uri": audio_uri },
            });

            let response = self
                .client
                .post(format!("{}/speech:longrunningrecognize", self.endpoint))
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .map_err(|e| SegscribeError::RecognitionSubmit {
                    message: format!("submit request failed: {e}"),
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().unwrap_or_default();
                return Err(SegscribeError::RecognitionSubmit {
                    message: format!("submit rejected with {status}: {}", detail.trim()),
                });
            }

            let parsed: SubmitResponse =
                response
                    .json()
                    .map_err(|e| SegscribeError::RecognitionSubmit {
                        message: format!("unreadable submit response: {e}"),
                    })?;

            parsed.name.ok_or_else(|| SegscribeError::RecognitionSubmit {
                message: "response carried no job identifier".to_string(),
            })
        }

        fn poll(&self, job_id: &str) -> Result<PollOutcome> {
            let response = self
                .client
                .get(format!("{}/operations/{}", self.endpoint, job_id))
                .bearer_auth(&self.token)
                .send()
                .map_err(|e| SegscribeError::JobFailed {
                    message: format!("poll request failed: {e}"),
                })?;

            if !response.status().is_success() {
                return Err(SegscribeError::JobFailed {
                    message: format!("poll rejected with {}", response.status()),
                });
            }

            let parsed: OperationResponse =
                response.json().map_err(|e| SegscribeError::JobFailed {
                    message: format!("unreadable poll response: {e}"),
                })?;

            Ok(parsed.into())
        }
    }
}

#[cfg(feature = "http-remote")]
pub use http::HttpSpeechClient;

/// Parse a wire offset such as "12.3s" (or a bare number) into seconds.
///
/// Unparseable values fall back to 0 rather than failing the whole fragment.
pub fn parse_offset_secs(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches('s')
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// Scripted behavior for one mock recognition job.
#[derive(Debug, Clone)]
pub struct ScriptedJob {
    reject_submit: bool,
    polls_until_done: u32,
    outcome: ScriptedOutcome,
}

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    /// Terminal success: one result block per (offset, text) entry.
    Transcript(Vec<(f64, String)>),
    /// Terminal success with an empty result list.
    Empty,
    /// Terminal failure with a message.
    Failure(String),
    /// Never reaches a terminal state.
    NeverDone,
}

impl ScriptedJob {
    /// Succeeds on the first poll with the given (offset, text) entries.
    pub fn transcript(entries: &[(f64, &str)]) -> Self {
        Self {
            reject_submit: false,
            polls_until_done: 1,
            outcome: ScriptedOutcome::Transcript(
                entries
                    .iter()
                    .map(|(offset, text)| (*offset, text.to_string()))
                    .collect(),
            ),
        }
    }

    /// Succeeds terminally but with no results.
    pub fn empty() -> Self {
        Self {
            reject_submit: false,
            polls_until_done: 1,
            outcome: ScriptedOutcome::Empty,
        }
    }

    /// Fails terminally with the backend message.
    pub fn failure(message: &str) -> Self {
        Self {
            reject_submit: false,
            polls_until_done: 1,
            outcome: ScriptedOutcome::Failure(message.to_string()),
        }
    }

    /// Stays non-terminal forever.
    pub fn never_done() -> Self {
        Self {
            reject_submit: false,
            polls_until_done: u32::MAX,
            outcome: ScriptedOutcome::NeverDone,
        }
    }

    /// Rejects the submission itself.
    pub fn reject() -> Self {
        Self {
            reject_submit: true,
            polls_until_done: 1,
            outcome: ScriptedOutcome::Empty,
        }
    }

    /// Delay the terminal state until the nth poll.
    pub fn after_polls(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }
}

/// Mock recognition backend for testing.
///
/// Jobs are scripted per URI pattern (substring match); poll counts are
/// recorded so tests can assert exact polling behavior.
#[derive(Default)]
pub struct MockSpeechBackend {
    plans: Vec<(String, ScriptedJob)>,
    fallback: Option<ScriptedJob>,
    jobs: Mutex<HashMap<String, ScriptedJob>>,
    polls: Mutex<HashMap<String, u32>>,
    next_id: AtomicUsize,
}

impl MockSpeechBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the job used for URIs containing `pattern`.
    pub fn with_job(mut self, pattern: &str, job: ScriptedJob) -> Self {
        self.plans.push((pattern.to_string(), job));
        self
    }

    /// Script the job used when no pattern matches.
    pub fn with_fallback(mut self, job: ScriptedJob) -> Self {
        self.fallback = Some(job);
        self
    }

    /// Total polls across all jobs.
    pub fn total_polls(&self) -> u32 {
        self.polls.lock().expect("poll log poisoned").values().sum()
    }

    /// Number of jobs submitted so far.
    pub fn submitted_jobs(&self) -> usize {
        self.next_id.load(Ordering::SeqCst)
    }
}

impl SpeechBackend for MockSpeechBackend {
    fn submit(&self, audio_uri: &str, _config: &RecognitionConfig) -> Result<String> {
        let plan = self
            .plans
            .iter()
            .find(|(pattern, _)| audio_uri.contains(pattern.as_str()))
            .map(|(_, job)| job.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| SegscribeError::RecognitionSubmit {
                message: format!("no scripted outcome for {audio_uri}"),
            })?;

        if plan.reject_submit {
            return Err(SegscribeError::RecognitionSubmit {
                message: "submission rejected by scripted backend".to_string(),
            });
        }

        let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs
            .lock()
            .expect("job table poisoned")
            .insert(id.clone(), plan);
        Ok(id)
    }

    fn poll(&self, job_id: &str) -> Result<PollOutcome> {
        let job = self
            .jobs
            .lock()
            .expect("job table poisoned")
            .get(job_id)
            .cloned()
            .ok_or_else(|| SegscribeError::JobFailed {
                message: format!("unknown job {job_id}"),
            })?;

        let count = {
            let mut polls = self.polls.lock().expect("poll log poisoned");
            let entry = polls.entry(job_id.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if matches!(job.outcome, ScriptedOutcome::NeverDone) || count < job.polls_until_done {
            return Ok(PollOutcome::running());
        }

        Ok(match &job.outcome {
            ScriptedOutcome::Transcript(entries) => PollOutcome::succeeded(
                entries
                    .iter()
                    .map(|(offset, text)| RecognitionResult {
                        alternatives: vec![RecognitionAlternative {
                            transcript: text.clone(),
                            words: vec![WordTiming {
                                word: text
                                    .split_whitespace()
                                    .next()
                                    .unwrap_or_default()
                                    .to_string(),
                                start_secs: *offset,
                            }],
                        }],
                    })
                    .collect(),
            ),
            ScriptedOutcome::Empty => PollOutcome::succeeded(Vec::new()),
            ScriptedOutcome::Failure(message) => PollOutcome::failed(message),
            ScriptedOutcome::NeverDone => PollOutcome::running(),
        })
    }
}
