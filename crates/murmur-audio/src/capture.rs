use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::frame::AudioFrame;
use crate::queue::FrameQueue;
use murmur_foundation::AudioError;

/// Requested capture parameters.
#[derive(Debug, Clone)]
pub struct StreamSpec {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per [`AudioFrame`] pushed into the queue.
    pub frame_size: usize,
    /// Input device name; `None` selects the host default.
    pub device: Option<String>,
}

/// An open capture stream. Dropping it closes the device stream and
/// guarantees no further frames are produced.
pub trait CaptureStream {}

/// Seam over the audio-capture subsystem so the session controller can
/// be exercised without hardware.
pub trait CaptureSource {
    fn open(
        &self,
        spec: &StreamSpec,
        queue: Arc<FrameQueue>,
    ) -> Result<Box<dyn CaptureStream>, AudioError>;
}

/// cpal-backed capture source.
pub struct CpalSource {
    host: cpal::Host,
}

impl CpalSource {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }
}

impl Default for CpalSource {
    fn default() -> Self {
        Self::new()
    }
}

struct CpalStream {
    _stream: Stream,
}

impl CaptureStream for CpalStream {}

/// Accumulates driver buffers into exact `frame_size` frames.
///
/// Runs inside the audio callback: no recognition work, minimal
/// allocation, bounded time per invocation.
struct FrameAssembler {
    queue: Arc<FrameQueue>,
    pending: Vec<i16>,
    frame_size: usize,
    sample_rate: u32,
    input_channels: u16,
}

impl FrameAssembler {
    fn new(queue: Arc<FrameQueue>, frame_size: usize, sample_rate: u32, input_channels: u16) -> Self {
        Self {
            queue,
            pending: Vec::with_capacity(frame_size * 2),
            frame_size,
            sample_rate,
            input_channels,
        }
    }

    fn feed(&mut self, samples: &[i16]) {
        if self.input_channels <= 1 {
            self.pending.extend_from_slice(samples);
        } else {
            // Downmix interleaved channels by averaging.
            let ch = self.input_channels as usize;
            for group in samples.chunks_exact(ch) {
                let sum: i32 = group.iter().map(|&s| s as i32).sum();
                self.pending.push((sum / ch as i32) as i16);
            }
        }

        while self.pending.len() >= self.frame_size {
            let rest = self.pending.split_off(self.frame_size);
            let samples = std::mem::replace(&mut self.pending, rest);
            let frame = AudioFrame {
                samples,
                timestamp: Instant::now(),
                sample_rate: self.sample_rate,
                channels: 1,
            };
            if !self.queue.push(frame) {
                // Queue closed: the session is shutting down.
                return;
            }
        }
    }
}

impl CaptureSource for CpalSource {
    fn open(
        &self,
        spec: &StreamSpec,
        queue: Arc<FrameQueue>,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        let device = match &spec.device {
            Some(name) => self
                .host
                .input_devices()
                .map_err(|e| AudioError::Fatal(format!("cannot enumerate input devices: {}", e)))?
                .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
                .ok_or_else(|| AudioError::DeviceNotFound {
                    name: Some(name.clone()),
                })?,
            None => self
                .host
                .default_input_device()
                .ok_or(AudioError::DeviceNotFound { name: None })?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!(target: "audio", "Opening audio device: {}", device_name);

        let (config, sample_format) = negotiate_config(&device, spec)?;
        info!(target: "audio", "Audio config: {:?} ({:?})", config, sample_format);

        if config.sample_rate.0 != spec.sample_rate {
            warn!(
                target: "audio",
                "Device does not support {} Hz; capturing at {} Hz",
                spec.sample_rate,
                config.sample_rate.0
            );
        }

        let err_fn = |err: cpal::StreamError| {
            // Overflow/underflow at the driver is non-fatal; log and continue.
            warn!(target: "audio", "Audio stream error: {}", err);
        };

        let mut assembler =
            FrameAssembler::new(queue, spec.frame_size, config.sample_rate.0, config.channels);

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    assembler.feed(data);
                },
                err_fn,
                None,
            )?,
            SampleFormat::F32 => {
                let mut scratch: Vec<i16> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        scratch.clear();
                        scratch.extend(
                            data.iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                        );
                        assembler.feed(&scratch);
                    },
                    err_fn,
                    None,
                )?
            }
            other => {
                return Err(AudioError::FormatNotSupported {
                    format: format!("{:?}", other),
                })
            }
        };

        stream.play()?;

        Ok(Box::new(CpalStream { _stream: stream }))
    }
}

/// Pick a stream config, preferring the requested rate and mono input.
fn negotiate_config(
    device: &cpal::Device,
    spec: &StreamSpec,
) -> Result<(StreamConfig, SampleFormat), AudioError> {
    let mut rate_match: Option<cpal::SupportedStreamConfigRange> = None;
    let mut fallback: Option<cpal::SupportedStreamConfigRange> = None;

    for range in device.supported_input_configs()? {
        if fallback.is_none() {
            fallback = Some(range.clone());
        }
        if range.min_sample_rate().0 <= spec.sample_rate
            && spec.sample_rate <= range.max_sample_rate().0
        {
            if range.channels() == spec.channels {
                rate_match = Some(range);
                break;
            }
            if rate_match.is_none() {
                rate_match = Some(range);
            }
        }
    }

    if let Some(range) = rate_match {
        let format = range.sample_format();
        return Ok((
            StreamConfig {
                channels: range.channels(),
                sample_rate: cpal::SampleRate(spec.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            },
            format,
        ));
    }

    // Requested rate unsupported: take what the device offers. The
    // frames carry the actual rate so downstream can at least warn.
    if let Some(range) = fallback {
        let supported = range.with_max_sample_rate();
        let format = supported.sample_format();
        return Ok((supported.config(), format));
    }

    Err(AudioError::FormatNotSupported {
        format: "no supported input configs".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn assembler_emits_exact_frames() {
        let queue = Arc::new(FrameQueue::new(8));
        let mut asm = FrameAssembler::new(Arc::clone(&queue), 4, 16_000, 1);

        asm.feed(&[1, 2, 3]);
        assert!(queue.is_empty());
        asm.feed(&[4, 5, 6, 7, 8, 9]);

        let first = queue.pop(Duration::from_millis(10)).unwrap();
        assert_eq!(first.samples, vec![1, 2, 3, 4]);
        let second = queue.pop(Duration::from_millis(10)).unwrap();
        assert_eq!(second.samples, vec![5, 6, 7, 8]);
        // One sample still pending.
        assert!(queue.is_empty());
    }

    #[test]
    fn assembler_downmixes_stereo() {
        let queue = Arc::new(FrameQueue::new(8));
        let mut asm = FrameAssembler::new(Arc::clone(&queue), 2, 16_000, 2);

        asm.feed(&[100, 200, -50, 50]);
        let frame = queue.pop(Duration::from_millis(10)).unwrap();
        assert_eq!(frame.samples, vec![150, 0]);
        assert_eq!(frame.channels, 1);
    }

    #[test]
    fn assembler_stops_on_closed_queue() {
        let queue = Arc::new(FrameQueue::new(8));
        let mut asm = FrameAssembler::new(Arc::clone(&queue), 2, 16_000, 1);
        queue.close();
        asm.feed(&[1, 2, 3, 4]);
        assert!(queue.is_empty());
    }
}
