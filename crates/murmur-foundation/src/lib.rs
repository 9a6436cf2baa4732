//! Foundation types for Murmur: error taxonomy and session state machine.

pub mod error;
pub mod state;

pub use error::{AudioError, SessionError, SttError};
pub use state::{SessionState, StateManager};
