//! Audio capture and frame buffering for Murmur.
//!
//! The capture adapter runs inside the audio driver's callback thread
//! and must never block; the [`queue::FrameQueue`] is the sole hand-off
//! point to the recognition worker.

pub mod capture;
pub mod frame;
pub mod queue;

pub use capture::{CaptureSource, CaptureStream, CpalSource, StreamSpec};
pub use frame::AudioFrame;
pub use queue::FrameQueue;
