//! Foundation crate tests
//!
//! Tests cover:
//! - Error types (SessionError, AudioError, SttError variants and conversions)
//! - Session state machine transition validation

use murmur_foundation::error::{AudioError, SessionError, SttError};
use murmur_foundation::state::{SessionState, StateManager};

// ─── Error Type Tests ───────────────────────────────────────────────

#[test]
fn audio_error_device_not_found() {
    let err = AudioError::DeviceNotFound {
        name: Some("test_mic".to_string()),
    };
    let msg = format!("{}", err);
    assert!(msg.contains("test_mic"));
}

#[test]
fn audio_error_format_not_supported() {
    let err = AudioError::FormatNotSupported {
        format: "f64".to_string(),
    };
    let msg = format!("{}", err);
    assert!(msg.contains("f64"));
}

#[test]
fn stt_error_model_not_found() {
    let err = SttError::ModelNotFound {
        path: "/models/vosk-small".into(),
    };
    let msg = format!("{}", err);
    assert!(msg.contains("vosk-small"));
}

#[test]
fn stt_error_decode_failed() {
    let err = SttError::DecodeFailed("bad frame".to_string());
    let msg = format!("{}", err);
    assert!(msg.contains("bad frame"));
}

#[test]
fn session_error_from_stt_error() {
    let stt_err = SttError::ModelLoad("missing files".to_string());
    let err: SessionError = stt_err.into();
    assert!(matches!(err, SessionError::ModelLoad(_)));
}

#[test]
fn session_error_from_audio_error() {
    let audio_err = AudioError::DeviceNotFound { name: None };
    let err: SessionError = audio_err.into();
    assert!(matches!(err, SessionError::Audio(_)));
}

#[test]
fn session_error_misuse_messages() {
    assert!(format!("{}", SessionError::AlreadyRunning).contains("already running"));
    assert!(format!("{}", SessionError::NotRunning).contains("not running"));
}

// ─── State Machine Tests ────────────────────────────────────────────

#[test]
fn state_starts_idle() {
    let mgr = StateManager::new();
    assert_eq!(mgr.current(), SessionState::Idle);
}

#[test]
fn full_lifecycle_transitions_are_valid() {
    let mgr = StateManager::new();
    mgr.transition(SessionState::Running).unwrap();
    mgr.transition(SessionState::Stopping).unwrap();
    mgr.transition(SessionState::Stopped).unwrap();
    assert_eq!(mgr.current(), SessionState::Stopped);
}

#[test]
fn restart_after_stop_is_valid() {
    let mgr = StateManager::new();
    mgr.transition(SessionState::Running).unwrap();
    mgr.transition(SessionState::Stopping).unwrap();
    mgr.transition(SessionState::Stopped).unwrap();
    mgr.transition(SessionState::Running).unwrap();
    assert_eq!(mgr.current(), SessionState::Running);
}

#[test]
fn skipping_stopping_is_rejected() {
    let mgr = StateManager::new();
    mgr.transition(SessionState::Running).unwrap();
    let err = mgr.transition(SessionState::Stopped).unwrap_err();
    assert!(matches!(err, SessionError::Fatal(_)));
    // State unchanged after a rejected transition.
    assert_eq!(mgr.current(), SessionState::Running);
}

#[test]
fn idle_cannot_stop() {
    let mgr = StateManager::new();
    assert!(mgr.transition(SessionState::Stopping).is_err());
}

#[test]
fn subscribers_observe_transitions() {
    let mgr = StateManager::new();
    let rx = mgr.subscribe();
    mgr.transition(SessionState::Running).unwrap();
    mgr.transition(SessionState::Stopping).unwrap();
    assert_eq!(rx.recv().unwrap(), SessionState::Running);
    assert_eq!(rx.recv().unwrap(), SessionState::Stopping);
}
