use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use murmur_audio::{CaptureSource, CaptureStream, CpalSource, FrameQueue, StreamSpec};
use murmur_foundation::{SessionError, SessionState, StateManager, SttError};
use murmur_stt::{RecognitionWorker, SttMetrics, Transcriber, TranscriptionEvent};

/// Immutable session configuration, fixed at `start`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path to the recognizer model directory
    pub model_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per frame handed to the recognizer
    pub frame_size: usize,
    /// Frame queue capacity (drop-oldest beyond this)
    pub queue_capacity: usize,
    /// Input device name; `None` selects the host default
    pub device: Option<String>,
    /// Deliver partial hypotheses to the callback as well
    pub emit_partials: bool,
    /// Bounded wait for the worker thread on `stop`
    pub join_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model_path: "vosk-model-small-en-us-0.15".to_string(),
            sample_rate: 16_000,
            channels: 1,
            frame_size: 8_000,
            queue_capacity: 64,
            device: None,
            emit_partials: false,
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl SessionConfig {
    /// Worker poll interval: one frame period, clamped to stay
    /// responsive to shutdown without spinning.
    fn poll_interval(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::from_millis(100);
        }
        let period = Duration::from_nanos(
            self.frame_size as u64 * 1_000_000_000 / self.sample_rate as u64,
        );
        period.clamp(Duration::from_millis(10), Duration::from_millis(500))
    }
}

/// Invoked with each finalized transcript segment (and partials when
/// opted in), in order, from the worker thread.
pub type TranscriptCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Builds the recognizer inside `start` so load failures surface to
/// the caller before any thread exists.
pub type TranscriberFactory =
    Box<dyn Fn(&SessionConfig) -> Result<Box<dyn Transcriber + Send>, SttError>>;

/// Counters observable by the embedder.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Frames evicted from the queue under backpressure
    pub frames_dropped: u64,
    pub stt: SttMetrics,
}

struct ActiveSession {
    queue: Arc<FrameQueue>,
    stream: Box<dyn CaptureStream>,
    worker: JoinHandle<()>,
    metrics: Arc<RwLock<SttMetrics>>,
    /// Once set, the event sink discards everything. Covers the forced
    /// stop path where the worker outlives the join timeout.
    quiesce: Arc<AtomicBool>,
}

/// Owns the session lifecycle: the frame queue, the capture stream,
/// the worker thread, and routing of recognition events to the
/// registered callback.
pub struct SessionController {
    config: SessionConfig,
    factory: TranscriberFactory,
    callback: TranscriptCallback,
    source: Box<dyn CaptureSource>,
    state: StateManager,
    active: Option<ActiveSession>,
    last_stats: SessionStats,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        factory: TranscriberFactory,
        callback: TranscriptCallback,
    ) -> Self {
        Self::with_source(config, factory, callback, Box::new(CpalSource::new()))
    }

    /// Like [`SessionController::new`] but with a caller-supplied
    /// capture source (used by tests to run without hardware).
    pub fn with_source(
        config: SessionConfig,
        factory: TranscriberFactory,
        callback: TranscriptCallback,
        source: Box<dyn CaptureSource>,
    ) -> Self {
        Self {
            config,
            factory,
            callback,
            source,
            state: StateManager::new(),
            active: None,
            last_stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.current()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start capturing and transcribing.
    ///
    /// Accepted from `Idle` and, so a stopped session can be restarted
    /// with the same configuration, from `Stopped`; any other state
    /// fails with [`SessionError::AlreadyRunning`]. Startup errors
    /// (bad config, model load, no capture device) are returned before
    /// any thread is started; there is no partial startup to unwind.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state.current() {
            SessionState::Idle | SessionState::Stopped => {}
            _ => return Err(SessionError::AlreadyRunning),
        }

        self.validate()?;

        let transcriber = (self.factory)(&self.config)?;
        let queue = Arc::new(FrameQueue::new(self.config.queue_capacity));

        let spec = StreamSpec {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            frame_size: self.config.frame_size,
            device: self.config.device.clone(),
        };
        let stream = self.source.open(&spec, Arc::clone(&queue))?;

        let quiesce = Arc::new(AtomicBool::new(false));
        let worker = RecognitionWorker::new(
            Arc::clone(&queue),
            transcriber,
            self.config.poll_interval(),
            self.event_sink(Arc::clone(&quiesce)),
        );
        let metrics = worker.metrics_handle();
        let worker = match worker.spawn() {
            Ok(handle) => handle,
            Err(e) => {
                drop(stream);
                queue.close();
                return Err(SessionError::Fatal(format!(
                    "failed to spawn recognition worker: {}",
                    e
                )));
            }
        };

        self.active = Some(ActiveSession {
            queue,
            stream,
            worker,
            metrics,
            quiesce,
        });
        self.state.transition(SessionState::Running)?;
        info!(target: "session", "Session started (model: {})", self.config.model_path);
        Ok(())
    }

    /// Stop the session: close the capture stream, drain the queue,
    /// and join the worker with a bounded wait.
    ///
    /// After `stop` returns no further callback invocations occur.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.state.current() != SessionState::Running {
            return Err(SessionError::NotRunning);
        }
        self.state.transition(SessionState::Stopping)?;

        let active = self
            .active
            .take()
            .ok_or_else(|| SessionError::Fatal("running session has no active state".into()))?;

        // Order matters: silence the producer first, then signal the
        // worker to drain what is already queued.
        drop(active.stream);
        active.queue.close();

        let deadline = Instant::now() + self.config.join_timeout;
        while !active.worker.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if active.worker.is_finished() {
            if active.worker.join().is_err() {
                error!(target: "session", "Recognition worker panicked");
            }
        } else {
            warn!(
                target: "session",
                "Recognition worker did not stop within {:?}; releasing resources anyway",
                self.config.join_timeout
            );
        }
        // The detached worker may still surface an event after the
        // timeout; the sink discards it from here on.
        active.quiesce.store(true, Ordering::SeqCst);

        self.last_stats = SessionStats {
            frames_dropped: active.queue.dropped(),
            stt: active.metrics.read().clone(),
        };

        self.state.transition(SessionState::Stopped)?;
        info!(target: "session", "Session stopped");
        Ok(())
    }

    /// Snapshot of queue drops and worker metrics; after `stop` this
    /// reflects the final numbers of the last session.
    pub fn stats(&self) -> SessionStats {
        match &self.active {
            Some(active) => SessionStats {
                frames_dropped: active.queue.dropped(),
                stt: active.metrics.read().clone(),
            },
            None => self.last_stats.clone(),
        }
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.config.model_path.is_empty() {
            return Err(SessionError::Config("model path must not be empty".into()));
        }
        if self.config.sample_rate == 0 {
            return Err(SessionError::Config("sample rate must be positive".into()));
        }
        if self.config.channels == 0 {
            return Err(SessionError::Config("channel count must be positive".into()));
        }
        if self.config.frame_size == 0 {
            return Err(SessionError::Config("frame size must be positive".into()));
        }
        if self.config.queue_capacity == 0 {
            return Err(SessionError::Config(
                "queue capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Sink handed to the worker: filters partials per configuration,
    /// drops everything once `quiesce` is set, and shields the
    /// pipeline from a misbehaving callback.
    fn event_sink(&self, quiesce: Arc<AtomicBool>) -> murmur_stt::worker::EventSink {
        let callback = Arc::clone(&self.callback);
        let emit_partials = self.config.emit_partials;
        Box::new(move |event: TranscriptionEvent| {
            if quiesce.load(Ordering::SeqCst) {
                return;
            }
            let text = match event {
                TranscriptionEvent::Final { text, .. } => text,
                TranscriptionEvent::Partial { text, .. } if emit_partials => text,
                TranscriptionEvent::Partial { .. } => return,
            };
            if catch_unwind(AssertUnwindSafe(|| callback(&text))).is_err() {
                error!(target: "session", "Transcript callback panicked; continuing");
            }
        })
    }
}
