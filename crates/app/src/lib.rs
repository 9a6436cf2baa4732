//! Murmur application: session lifecycle and process glue.

pub mod session;
pub mod shutdown;

pub use session::{
    SessionConfig, SessionController, SessionStats, TranscriberFactory, TranscriptCallback,
};
