//! Speech-to-text abstraction layer for Murmur.
//!
//! Defines transcription events, configuration, the [`Transcriber`]
//! trait implemented by recognition engines, and the recognition
//! worker that bridges the frame queue to an engine.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod mock;
pub mod types;
pub mod worker;

pub use types::{SttMetrics, TranscriptionConfig, TranscriptionEvent};
pub use worker::RecognitionWorker;

static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID.
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Streaming transcription interface.
///
/// Implementations are stateful and not safe for concurrent use; the
/// recognition worker is the only caller, from a single thread.
pub trait Transcriber {
    /// Feed one frame of mono S16LE PCM samples.
    ///
    /// Returns a `Final` event when the engine reaches an utterance
    /// boundary, a `Partial` event for an interim hypothesis, or
    /// `None` when there is nothing to report. A `DecodeFailed` error
    /// applies to this frame only; the caller may continue.
    fn accept_frame(
        &mut self,
        pcm: &[i16],
    ) -> Result<Option<TranscriptionEvent>, murmur_foundation::SttError>;

    /// Signal end of input and flush any trailing utterance.
    fn finalize_utterance(
        &mut self,
    ) -> Result<Option<TranscriptionEvent>, murmur_foundation::SttError>;
}

impl<T: Transcriber + ?Sized> Transcriber for Box<T> {
    fn accept_frame(
        &mut self,
        pcm: &[i16],
    ) -> Result<Option<TranscriptionEvent>, murmur_foundation::SttError> {
        (**self).accept_frame(pcm)
    }

    fn finalize_utterance(
        &mut self,
    ) -> Result<Option<TranscriptionEvent>, murmur_foundation::SttError> {
        (**self).finalize_utterance()
    }
}
