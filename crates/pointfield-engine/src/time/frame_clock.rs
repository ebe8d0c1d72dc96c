use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Simulation step in seconds, clamped.
    pub dt: f32,

    /// Wall-clock time since the previous tick, unclamped.
    ///
    /// Used for reporting; stalls show up here but not in `dt`.
    pub elapsed: Duration,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// Unclamped frame duration in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Frame clock producing `FrameTime` snapshots, one per redraw.
///
/// The simulation step is clamped so a debugger pause or a minimized window
/// does not launch the points off screen on the next frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom simulation step clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock to now.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;

        let ft = FrameTime {
            dt: elapsed.clamp(self.dt_min, self.dt_max).as_secs_f32(),
            elapsed,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
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
    fn long_stall_is_clamped_for_simulation_only() {
        let mut clock = FrameClock::new();
        let start = clock.last;

        let ft = clock.tick_at(start + Duration::from_secs(2));
        assert_eq!(ft.dt, 0.25);
        assert_eq!(ft.elapsed_ms(), 2000.0);
        assert_eq!(ft.frame_index, 0);
    }

    #[test]
    fn frames_are_counted() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        clock.tick_at(start + Duration::from_millis(16));
        let ft = clock.tick_at(start + Duration::from_millis(32));
        assert_eq!(ft.frame_index, 1);
        assert!((ft.dt - 0.016).abs() < 1e-6);
    }
}
