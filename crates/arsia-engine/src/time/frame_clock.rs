use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous frame.
    pub dt: Duration,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Measures wall time between presented frames.
///
/// Delta time is clamped so a debugger pause or a stalled compositor does not
/// feed a huge step into the fixed-timestep accumulator.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline, e.g. once the window becomes visible so setup time
    /// is not counted as the first frame.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Number of frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    /// Advances the clock to the current instant.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    ///
    /// An instant earlier than the previous one counts as zero elapsed time
    /// (and is then raised to the minimum clamp).
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt,
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
    fn frame_index_starts_at_zero_and_increments() {
        let mut clock = FrameClock::new();
        let base = Instant::now();
        assert_eq!(clock.tick_at(base).frame_index, 0);
        assert_eq!(clock.tick_at(base + Duration::from_millis(16)).frame_index, 1);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn dt_is_measured_between_ticks() {
        let mut clock = FrameClock::new();
        let base = Instant::now();
        clock.tick_at(base);
        let ft = clock.tick_at(base + Duration::from_millis(16));
        assert_eq!(ft.dt, Duration::from_millis(16));
    }

    #[test]
    fn long_stall_is_clamped_to_max() {
        let mut clock = FrameClock::new();
        let base = Instant::now();
        clock.tick_at(base);
        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert_eq!(ft.dt, FrameClock::DEFAULT_DT_MAX);
    }

    #[test]
    fn zero_elapsed_is_raised_to_min() {
        let mut clock = FrameClock::new();
        let base = Instant::now();
        clock.tick_at(base);
        let ft = clock.tick_at(base);
        assert_eq!(ft.dt, FrameClock::DEFAULT_DT_MIN);
    }

    #[test]
    fn custom_clamps_apply() {
        let mut clock =
            FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(10));
        let base = Instant::now();
        clock.tick_at(base);
        let ft = clock.tick_at(base + Duration::from_millis(40));
        assert_eq!(ft.dt, Duration::from_millis(10));
    }
}
