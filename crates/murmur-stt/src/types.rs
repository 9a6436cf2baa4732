//! Core types for speech-to-text functionality

use std::time::Instant;

/// Transcription event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionEvent {
    /// Partial transcription result (ongoing speech)
    Partial { utterance_id: u64, text: String },
    /// Final transcription result (speech segment complete)
    Final { utterance_id: u64, text: String },
}

impl TranscriptionEvent {
    pub fn text(&self) -> &str {
        match self {
            TranscriptionEvent::Partial { text, .. } => text,
            TranscriptionEvent::Final { text, .. } => text,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, TranscriptionEvent::Final { .. })
    }
}

/// Recognition worker metrics
#[derive(Debug, Clone, Default)]
pub struct SttMetrics {
    /// Total frames received from the queue
    pub frames_in: u64,
    /// Total frames successfully processed
    pub frames_out: u64,
    /// Number of partial transcriptions
    pub partial_count: u64,
    /// Number of final transcriptions
    pub final_count: u64,
    /// Number of per-frame decode errors (frames skipped)
    pub error_count: u64,
    /// Time of the last emitted event
    pub last_event_time: Option<Instant>,
}

/// Transcription configuration
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Path to the model directory
    pub model_path: String,
    /// Emit partial recognition results
    pub partial_results: bool,
    /// Maximum alternatives in results
    pub max_alternatives: u32,
    /// Include word-level output in results
    pub include_words: bool,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model_path: "vosk-model-small-en-us-0.15".to_string(),
            partial_results: false,
            max_alternatives: 1,
            include_words: false,
        }
    }
}
