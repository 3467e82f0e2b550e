//! Frame timing.

use std::time::{Duration, Instant};

/// Timing of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Zero-based index of the frame.
    pub frame_number: u64,
    /// Time between `begin_frame` and `end_frame`.
    pub frame_time: Duration,
    /// Frames per second implied by `frame_time` (0 when unknown).
    pub fps: f32,
}

impl FrameStats {
    /// Frame time in milliseconds.
    #[must_use]
    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time.as_secs_f64() * 1_000.0
    }
}

/// Measures frame boundaries.
#[derive(Debug, Default)]
pub struct FrameTimer {
    frame_start: Option<Instant>,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a timer with no frames recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a frame.
    pub fn begin(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Close the current frame.
    ///
    /// Without a preceding [`begin`](Self::begin) the frame time is zero.
    pub fn end(&mut self) -> FrameStats {
        let frame_time = self
            .frame_start
            .take()
            .map_or(Duration::ZERO, |start| start.elapsed());
        let fps = if frame_time.is_zero() {
            0.0
        } else {
            1.0 / frame_time.as_secs_f32()
        };

        let stats = FrameStats {
            frame_number: self.frame_count,
            frame_time,
            fps,
        };
        self.frame_count += 1;
        stats
    }

    /// Number of completed frames.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
