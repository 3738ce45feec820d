//! Remote collaborators: object storage and the speech-recognition backend.

pub mod speech;
pub mod store;

pub use speech::{
    MockSpeechBackend, PollOutcome, RecognitionAlternative, RecognitionConfig, RecognitionResult,
    ScriptedJob, SpeechBackend, WordTiming,
};
pub use store::{MemoryObjectStore, ObjectStore};

#[cfg(feature = "http-remote")]
pub use speech::HttpSpeechClient;
#[cfg(feature = "http-remote")]
pub use store::HttpObjectStore;
