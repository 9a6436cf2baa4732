use std::time::{Duration, Instant};

/// A fixed-duration chunk of captured PCM16 audio.
///
/// Created by the capture adapter, owned by the frame queue until
/// dequeued, then owned exclusively by the recognition worker.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub timestamp: Instant,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFrame {
    /// Wall-clock duration this frame covers.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_mono_16k() {
        let frame = AudioFrame {
            samples: vec![0; 8000],
            timestamp: Instant::now(),
            sample_rate: 16_000,
            channels: 1,
        };
        assert_eq!(frame.duration(), Duration::from_millis(500));
    }

    #[test]
    fn duration_zero_rate_is_zero() {
        let frame = AudioFrame {
            samples: vec![0; 100],
            timestamp: Instant::now(),
            sample_rate: 0,
            channels: 1,
        };
        assert_eq!(frame.duration(), Duration::ZERO);
    }
}
