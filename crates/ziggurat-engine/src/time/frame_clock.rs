use std::time::{Duration, Instant};

// Clamp bounds for per-frame delta time. The floor avoids zero-length frames
// on very fast loops; the ceiling keeps animation sane after a debugger pause
// or a long stall.
const MIN_DT: Duration = Duration::from_micros(100);
const MAX_DT: Duration = Duration::from_millis(250);

/// Timing for the frame in flight.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Frames ticked before this one.
    pub frame_index: u64,
}

/// Per-window frame timer; `tick` once per presented frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(MIN_DT, MAX_DT);
        self.last = now;

        let time = FrameTime {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_up_from_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.tick().frame_index, 2);
    }

    #[test]
    fn dt_stays_within_the_clamp_bounds() {
        let mut clock = FrameClock::new();
        let time = clock.tick();
        assert!(time.dt >= MIN_DT.as_secs_f32() - f32::EPSILON);
        assert!(time.dt <= MAX_DT.as_secs_f32() + f32::EPSILON);
    }
}
