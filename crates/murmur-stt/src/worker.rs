use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::types::{SttMetrics, TranscriptionEvent};
use crate::Transcriber;
use murmur_audio::{AudioFrame, FrameQueue};

/// Callback invoked with each transcription event, on the worker thread,
/// in processing order.
pub type EventSink = Box<dyn FnMut(TranscriptionEvent) + Send>;

#[derive(Debug)]
enum WorkerState {
    WaitingForFrame,
    Processing(AudioFrame),
    Draining,
    Done,
}

/// Dedicated processing loop that dequeues frames and forwards them to
/// the recognizer.
///
/// The recognizer handle is touched exclusively by this thread. The
/// loop suspends only inside `FrameQueue::pop`, bounded by
/// `poll_interval`, so queue closure is observed promptly. A decode
/// error skips the offending frame and never terminates the session.
pub struct RecognitionWorker<T: Transcriber> {
    queue: Arc<FrameQueue>,
    transcriber: T,
    sink: EventSink,
    poll_interval: Duration,
    metrics: Arc<RwLock<SttMetrics>>,
}

impl<T: Transcriber + Send + 'static> RecognitionWorker<T> {
    pub fn new(
        queue: Arc<FrameQueue>,
        transcriber: T,
        poll_interval: Duration,
        sink: EventSink,
    ) -> Self {
        Self {
            queue,
            transcriber,
            sink,
            poll_interval,
            metrics: Arc::new(RwLock::new(SttMetrics::default())),
        }
    }

    /// Shared metrics handle, readable while the worker runs.
    pub fn metrics_handle(&self) -> Arc<RwLock<SttMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Spawn the worker on its own named thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("recognition-worker".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        tracing::info!(target: "stt", "Recognition worker started");

        let mut state = WorkerState::WaitingForFrame;
        loop {
            state = match state {
                WorkerState::WaitingForFrame => match self.queue.pop(self.poll_interval) {
                    Some(frame) => WorkerState::Processing(frame),
                    None if self.queue.is_closed() => WorkerState::Draining,
                    None => WorkerState::WaitingForFrame,
                },
                WorkerState::Processing(frame) => {
                    self.process(frame);
                    WorkerState::WaitingForFrame
                }
                WorkerState::Draining => {
                    // Frames enqueued before closure are still owed to
                    // the recognizer.
                    while let Some(frame) = self.queue.pop(Duration::ZERO) {
                        self.process(frame);
                    }
                    self.finalize();
                    WorkerState::Done
                }
                WorkerState::Done => break,
            };
        }

        let metrics = self.metrics.read();
        tracing::info!(
            target: "stt",
            "Recognition worker done - frames in: {}, out: {}, partials: {}, finals: {}, errors: {}",
            metrics.frames_in,
            metrics.frames_out,
            metrics.partial_count,
            metrics.final_count,
            metrics.error_count
        );
    }

    fn process(&mut self, frame: AudioFrame) {
        self.metrics.write().frames_in += 1;

        match self.transcriber.accept_frame(&frame.samples) {
            Ok(Some(event)) => {
                self.metrics.write().frames_out += 1;
                self.emit(event);
            }
            Ok(None) => {
                self.metrics.write().frames_out += 1;
            }
            Err(e) => {
                self.metrics.write().error_count += 1;
                tracing::warn!(target: "stt", "Decode error, skipping frame: {}", e);
            }
        }
    }

    fn finalize(&mut self) {
        match self.transcriber.finalize_utterance() {
            Ok(Some(event)) => self.emit(event),
            Ok(None) => {}
            Err(e) => {
                self.metrics.write().error_count += 1;
                tracing::warn!(target: "stt", "Finalize failed: {}", e);
            }
        }
    }

    fn emit(&mut self, event: TranscriptionEvent) {
        {
            let mut metrics = self.metrics.write();
            match &event {
                TranscriptionEvent::Partial { text, .. } => {
                    metrics.partial_count += 1;
                    tracing::debug!(target: "stt", "Partial: {}", text);
                }
                TranscriptionEvent::Final { text, .. } => {
                    metrics.final_count += 1;
                    tracing::info!(target: "stt", "Final: {}", text);
                }
            }
            metrics.last_event_time = Some(Instant::now());
        }
        (self.sink)(event);
    }
}
