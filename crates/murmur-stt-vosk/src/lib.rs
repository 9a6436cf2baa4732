//! Vosk speech recognition implementation for Murmur.
//!
//! The implementation is feature-gated behind the "vosk" feature
//! because the `vosk` crate links against the native libvosk library.

#[cfg(feature = "vosk")]
pub mod vosk_transcriber;

#[cfg(feature = "vosk")]
pub use vosk_transcriber::VoskTranscriber;

pub use murmur_stt::{next_utterance_id, Transcriber, TranscriptionConfig, TranscriptionEvent};
