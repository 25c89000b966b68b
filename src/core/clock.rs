//=========================================================================
// Frame Clock
//=========================================================================
//
// Measures frame deltas against the high-resolution clock and enforces
// the optional minimum frame time.
//
// The cap is a literal busy-wait: the clock is re-sampled until the
// delta reaches the minimum. A sleeping strategy cannot hit
// sub-millisecond frame boundaries on common schedulers, so the spin
// trades CPU for timing precision.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

//=== FrameClock ==========================================================

/// Tracks frame boundaries for the main loop.
///
/// Each call to [`FrameClock::next_frame`] marks the start of a frame and
/// returns the wall-clock delta since the previous boundary. The delta is
/// never below `min_frame_time` when one is set.
#[derive(Debug)]
pub(crate) struct FrameClock {
    prev_frame: Instant,
    min_frame_time: Option<Duration>,
}

impl FrameClock {
    /// Starts the clock at the current instant.
    pub fn start(min_frame_time: Option<Duration>) -> Self {
        Self {
            prev_frame: Instant::now(),
            min_frame_time,
        }
    }

    /// Marks a frame boundary and returns the delta since the previous one.
    ///
    /// With a minimum frame time set, re-samples the clock until the
    /// delta reaches it. The boundary recorded for the next frame is the
    /// instant the measurement was taken, not the instant this call
    /// returns, so time spent in frame work is part of the next delta.
    pub fn next_frame(&mut self) -> Duration {
        let mut frame_start = Instant::now();
        let mut dt = frame_start - self.prev_frame;

        if let Some(min_frame_time) = self.min_frame_time {
            while dt < min_frame_time {
                frame_start = Instant::now();
                dt = frame_start - self.prev_frame;
            }
        }

        self.prev_frame = frame_start;
        dt
    }
}

//=== Tests ===============================================================
