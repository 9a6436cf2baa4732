use murmur_foundation::SttError;
use murmur_stt::{next_utterance_id, Transcriber, TranscriptionConfig, TranscriptionEvent};
use tracing::warn;
use vosk::{CompleteResult, DecodingState, Model, PartialResult, Recognizer};

pub struct VoskTranscriber {
    recognizer: Recognizer,
    config: TranscriptionConfig,
    current_utterance_id: u64,
}

impl VoskTranscriber {
    /// Create a new VoskTranscriber with the given configuration.
    ///
    /// The model directory must exist; a missing or unreadable model is
    /// a startup error, surfaced before any audio flows.
    pub fn new(config: TranscriptionConfig, sample_rate: f32) -> Result<Self, SttError> {
        // Vosk models ship for 16 kHz; anything else degrades quality
        // but is not an error.
        if (sample_rate - 16000.0).abs() > 0.1 {
            warn!(
                target: "stt",
                "Sample rate {}Hz differs from the expected 16000Hz; \
                 transcription quality may suffer",
                sample_rate
            );
        }

        let model_path = std::path::Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(SttError::ModelNotFound {
                path: model_path.to_path_buf(),
            });
        }

        let model = Model::new(&config.model_path).ok_or_else(|| {
            SttError::ModelLoad(format!(
                "failed to load Vosk model from: {}",
                config.model_path
            ))
        })?;

        let mut recognizer = Recognizer::new(&model, sample_rate).ok_or_else(|| {
            SttError::Recognizer(format!(
                "failed to create recognizer with sample rate {}",
                sample_rate
            ))
        })?;

        recognizer.set_max_alternatives(config.max_alternatives as u16);
        recognizer.set_words(config.include_words);
        recognizer.set_partial_words(config.partial_results && config.include_words);

        Ok(Self {
            recognizer,
            config,
            current_utterance_id: next_utterance_id(),
        })
    }

    fn parse_complete_result(
        result: CompleteResult,
        utterance_id: u64,
    ) -> Option<TranscriptionEvent> {
        let text = match result {
            CompleteResult::Single(single) => single.text.to_string(),
            CompleteResult::Multiple(multiple) => multiple
                .alternatives
                .first()
                .map(|first| first.text.to_string())
                .unwrap_or_default(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(TranscriptionEvent::Final { utterance_id, text })
        }
    }

    fn parse_partial_result(partial: PartialResult, utterance_id: u64) -> Option<TranscriptionEvent> {
        let text = partial.partial;
        if text.trim().is_empty() {
            None
        } else {
            Some(TranscriptionEvent::Partial {
                utterance_id,
                text: text.to_string(),
            })
        }
    }
}

impl Transcriber for VoskTranscriber {
    fn accept_frame(&mut self, pcm: &[i16]) -> Result<Option<TranscriptionEvent>, SttError> {
        let state = self
            .recognizer
            .accept_waveform(pcm)
            .map_err(|e| SttError::DecodeFailed(format!("waveform acceptance failed: {:?}", e)))?;

        match state {
            DecodingState::Finalized => {
                // Utterance boundary: the current segment is complete.
                let result = self.recognizer.result();
                let event = Self::parse_complete_result(result, self.current_utterance_id);
                if event.is_some() {
                    self.current_utterance_id = next_utterance_id();
                }
                Ok(event)
            }
            DecodingState::Running => {
                if self.config.partial_results {
                    let partial = self.recognizer.partial_result();
                    Ok(Self::parse_partial_result(partial, self.current_utterance_id))
                } else {
                    Ok(None)
                }
            }
            DecodingState::Failed => Err(SttError::DecodeFailed(
                "recognition failed for current frame".to_string(),
            )),
        }
    }

    fn finalize_utterance(&mut self) -> Result<Option<TranscriptionEvent>, SttError> {
        let final_result = self.recognizer.final_result();
        let event = Self::parse_complete_result(final_result, self.current_utterance_id);
        self.current_utterance_id = next_utterance_id();
        Ok(event)
    }
}
