//! Mock transcriber for testing the pipeline without a real engine.

use crate::types::TranscriptionEvent;
use crate::{next_utterance_id, Transcriber};
use murmur_foundation::SttError;

/// Configuration for the mock transcriber
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Phrase "recognized" for a run of speech frames
    pub phrase: String,
    /// Emit a partial hypothesis on each speech frame
    pub partial_results: bool,
    /// Mean-amplitude threshold separating speech from silence
    pub energy_threshold: i16,
    /// Fail decoding on the Nth accepted frame (1-based)
    pub fail_on_frame: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            phrase: "mock test transcription".to_string(),
            partial_results: false,
            energy_threshold: 100,
            fail_on_frame: None,
        }
    }
}

/// Energy-based mock engine: frames above the threshold count as
/// speech; the first silent frame after speech is an utterance
/// boundary and yields a `Final` with the configured phrase.
#[derive(Debug)]
pub struct MockTranscriber {
    config: MockConfig,
    utterance_id: u64,
    in_speech: bool,
    frames_seen: u64,
}

impl MockTranscriber {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            utterance_id: next_utterance_id(),
            in_speech: false,
            frames_seen: 0,
        }
    }

    /// Mock that recognizes `phrase` for every speech run.
    pub fn recognizing(phrase: &str) -> Self {
        Self::new(MockConfig {
            phrase: phrase.to_string(),
            ..Default::default()
        })
    }

    fn mean_abs(pcm: &[i16]) -> i64 {
        if pcm.is_empty() {
            return 0;
        }
        let sum: i64 = pcm.iter().map(|&s| (s as i64).abs()).sum();
        sum / pcm.len() as i64
    }

    fn final_event(&mut self) -> TranscriptionEvent {
        let event = TranscriptionEvent::Final {
            utterance_id: self.utterance_id,
            text: self.config.phrase.clone(),
        };
        self.utterance_id = next_utterance_id();
        event
    }
}

impl Transcriber for MockTranscriber {
    fn accept_frame(&mut self, pcm: &[i16]) -> Result<Option<TranscriptionEvent>, SttError> {
        self.frames_seen += 1;
        if self.config.fail_on_frame == Some(self.frames_seen) {
            return Err(SttError::DecodeFailed("scripted decode failure".to_string()));
        }

        let is_speech = Self::mean_abs(pcm) > self.config.energy_threshold as i64;
        if is_speech {
            self.in_speech = true;
            if self.config.partial_results {
                return Ok(Some(TranscriptionEvent::Partial {
                    utterance_id: self.utterance_id,
                    text: self.config.phrase.clone(),
                }));
            }
            return Ok(None);
        }

        if self.in_speech {
            self.in_speech = false;
            return Ok(Some(self.final_event()));
        }

        Ok(None)
    }

    fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError> {
        if self.in_speech {
            self.in_speech = false;
            return Ok(Some(self.final_event()));
        }
        Ok(None)
    }
}
