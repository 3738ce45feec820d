//! Default configuration constants for segscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default segment duration in seconds.
///
/// Five minutes keeps each recognition job well under typical backend
/// per-request audio limits while leaving few enough segments that polling
/// overhead stays small.
pub const SEGMENT_SECONDS: u64 = 300;

/// Default polling interval in seconds between job status checks.
pub const POLL_INTERVAL_SECONDS: u64 = 10;

/// Default maximum number of poll attempts per recognition job.
///
/// 1000 attempts at the default 10 s interval bounds a single job's wait at
/// just under three hours. A job that is still not terminal by then is
/// reported as timed out for its segment only.
pub const MAX_POLL_ATTEMPTS: u32 = 1000;

/// Default number of concurrent recognition workers.
///
/// Each worker spends nearly all of its time blocked on network I/O, so a
/// small pool is enough to keep every in-flight job polled on schedule.
pub const WORKER_LIMIT: usize = 5;

/// Default language code for recognition requests.
pub const DEFAULT_LANGUAGE: &str = "ko-KR";

/// Audio channel count declared to the recognition backend.
pub const CHANNEL_COUNT: u32 = 2;

/// Fixed speaker count for diarization.
///
/// The backend is told to expect exactly two speakers; automatic speaker-count
/// detection is out of scope.
pub const DIARIZATION_SPEAKER_COUNT: u32 = 2;

/// Default object-key prefix for staged blobs.
pub const KEY_PREFIX: &str = "temp";

/// Environment variable holding the bearer token for remote services.
pub const TOKEN_ENV: &str = "SEGSCRIBE_TOKEN";
