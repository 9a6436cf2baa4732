use crate::error::SessionError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Owns the session state and validates transitions.
///
/// Only the session controller mutates the state; other components
/// observe changes through [`StateManager::subscribe`] rather than by
/// polling shared memory.
pub struct StateManager {
    state: Arc<RwLock<SessionState>>,
    state_tx: Sender<SessionState>,
    state_rx: Receiver<SessionState>,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(SessionState::Idle)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: SessionState) -> Result<(), SessionError> {
        let mut current = self.state.write();

        let valid = matches!(
            (*current, new_state),
            (SessionState::Idle, SessionState::Running)
                | (SessionState::Stopped, SessionState::Running)
                | (SessionState::Running, SessionState::Stopping)
                | (SessionState::Stopping, SessionState::Stopped)
        );

        if !valid {
            return Err(SessionError::Fatal(format!(
                "Invalid state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::info!(target: "session", "State transition: {:?} -> {:?}", *current, new_state);
        *current = new_state;
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> SessionState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> Receiver<SessionState> {
        self.state_rx.clone()
    }
}
