use std::path::PathBuf;
use thiserror::Error;

/// Caller-facing errors from the session controller.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyRunning,

    #[error("session is not running")]
    NotRunning,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("recognizer initialization failed: {0}")]
    ModelLoad(#[from] SttError),

    #[error("audio subsystem error: {0}")]
    Audio(#[from] AudioError),

    #[error("fatal error, cannot recover: {0}")]
    Fatal(String),
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("input device not found: {name:?}")]
    DeviceNotFound { name: Option<String> },

    #[error("format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("stream error: {0}")]
    Stream(#[from] cpal::StreamError),

    #[error("build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("fatal audio error: {0}")]
    Fatal(String),
}

/// Errors from the speech-to-text engine.
///
/// Model errors are fatal at startup and surfaced through
/// [`SessionError::ModelLoad`]; decode errors are recoverable and
/// isolated per frame by the recognition worker.
#[derive(Error, Debug)]
pub enum SttError {
    #[error("model not found at {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("recognizer error: {0}")]
    Recognizer(String),
}
