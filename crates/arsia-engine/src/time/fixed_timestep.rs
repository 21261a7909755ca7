use std::time::Duration;

/// Fixed-rate tick scheduler driven by frame deltas.
///
/// Each frame feeds its elapsed time into an accumulator. Whole tick intervals
/// are drained from the accumulator as ticks; the remainder carries over to
/// the next frame. Rendering is not gated by this type: callers render every
/// frame and run however many ticks `advance` returns first.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    interval: Duration,
    accumulator: Duration,
    max_ticks_per_frame: u32,
    max_backlog: Duration,
    ticks: u64,
}

/// Errors from constructing a [`FixedTimestep`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimestepError {
    /// Tick rate was zero, negative, or not finite.
    InvalidRate(f64),
    /// A zero tick cap would never run logic.
    ZeroTicksPerFrame,
}

impl std::fmt::Display for TimestepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRate(hz) => write!(f, "invalid tick rate: {hz} Hz"),
            Self::ZeroTicksPerFrame => f.write_str("max ticks per frame must be at least 1"),
        }
    }
}

impl std::error::Error for TimestepError {}

impl FixedTimestep {
    /// Logic rate of the game loop.
    pub const DEFAULT_TICK_RATE_HZ: f64 = 20.0;

    /// Backlog cap, in ticks.
    pub const DEFAULT_MAX_BACKLOG_TICKS: u32 = 5;

    /// Creates a scheduler running at `tick_rate_hz` with at most one tick per
    /// frame.
    pub fn new(tick_rate_hz: f64) -> Result<Self, TimestepError> {
        if !tick_rate_hz.is_finite() || tick_rate_hz <= 0.0 {
            return Err(TimestepError::InvalidRate(tick_rate_hz));
        }

        // Rates so low that the interval does not fit a `Duration` are rejected.
        let interval = Duration::try_from_secs_f64(1.0 / tick_rate_hz)
            .map_err(|_| TimestepError::InvalidRate(tick_rate_hz))?;
        if interval.is_zero() {
            return Err(TimestepError::InvalidRate(tick_rate_hz));
        }

        Ok(Self {
            interval,
            accumulator: Duration::ZERO,
            max_ticks_per_frame: 1,
            max_backlog: interval.saturating_mul(Self::DEFAULT_MAX_BACKLOG_TICKS),
            ticks: 0,
        })
    }

    /// Sets how many ticks a single frame may run.
    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Result<Self, TimestepError> {
        if max == 0 {
            return Err(TimestepError::ZeroTicksPerFrame);
        }
        self.max_ticks_per_frame = max;
        self.max_backlog = self.max_backlog.max(self.interval.saturating_mul(max));
        Ok(self)
    }

    /// Sets the largest amount of unprocessed time kept between frames.
    ///
    /// The cap saturates at `Duration::MAX`.
    pub fn with_max_backlog_ticks(mut self, ticks: u32) -> Self {
        self.max_backlog = self
            .interval
            .saturating_mul(ticks.max(self.max_ticks_per_frame));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Total ticks issued since creation.
    pub fn tick_index(&self) -> u64 {
        self.ticks
    }

    /// Unprocessed time currently held.
    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }

    /// Feeds one frame's elapsed time and returns the number of ticks to run.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator = self.accumulator.saturating_add(dt).min(self.max_backlog);

        let mut due = 0;
        while due < self.max_ticks_per_frame && self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            due += 1;
        }

        self.ticks = self.ticks.saturating_add(u64::from(due));
        due
    }

    /// Fraction of the next tick already accumulated, in `[0, 1]`.
    ///
    /// Stays at `1.0` while a backlog is pending.
    pub fn alpha(&self) -> f32 {
        let a = self.accumulator.as_secs_f64() / self.interval.as_secs_f64();
        a.clamp(0.0, 1.0) as f32
    }

    /// Drops any accumulated time.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            accumulator: Duration::ZERO,
            max_ticks_per_frame: 1,
            max_backlog: Duration::from_millis(50) * Self::DEFAULT_MAX_BACKLOG_TICKS,
            ticks: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn twenty_hz_is_fifty_ms() {
        let ts = FixedTimestep::new(20.0).unwrap();
        assert_eq!(ts.interval(), ms(50));
        assert_eq!(FixedTimestep::default().interval(), ms(50));
    }

    #[test]
    fn rejects_bad_rates() {
        assert_eq!(FixedTimestep::new(0.0).unwrap_err(), TimestepError::InvalidRate(0.0));
        assert!(FixedTimestep::new(-5.0).is_err());
        assert!(FixedTimestep::new(f64::NAN).is_err());
        assert!(FixedTimestep::new(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_rate_whose_interval_overflows_duration() {
        assert_eq!(
            FixedTimestep::new(1e-20).unwrap_err(),
            TimestepError::InvalidRate(1e-20)
        );
        assert!(FixedTimestep::new(f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn huge_interval_with_large_caps_saturates() {
        let ts = FixedTimestep::new(1e-10)
            .unwrap()
            .with_max_ticks_per_frame(u32::MAX)
            .unwrap()
            .with_max_backlog_ticks(u32::MAX);
        assert_eq!(ts.max_ticks_per_frame(), u32::MAX);

        let mut ts = ts;
        let three = ts.interval() * 3;
        assert_eq!(ts.advance(three), 3);
        assert_eq!(ts.accumulated(), Duration::ZERO);
    }

    #[test]
    fn rejects_zero_tick_cap() {
        let res = FixedTimestep::default().with_max_ticks_per_frame(0);
        assert_eq!(res.unwrap_err(), TimestepError::ZeroTicksPerFrame);
    }

    #[test]
    fn no_tick_below_one_interval() {
        let mut ts = FixedTimestep::default();
        assert_eq!(ts.advance(ms(16)), 0);
        assert_eq!(ts.advance(ms(16)), 0);
        assert_eq!(ts.advance(ms(16)), 0);
        assert_eq!(ts.tick_index(), 0);
    }

    #[test]
    fn tick_once_interval_accumulates() {
        let mut ts = FixedTimestep::default();
        for _ in 0..3 {
            ts.advance(ms(16));
        }
        // 48ms so far, the 4th frame crosses 50ms.
        assert_eq!(ts.advance(ms(16)), 1);
        assert_eq!(ts.accumulated(), ms(14));
        assert_eq!(ts.tick_index(), 1);
    }

    #[test]
    fn exact_interval_ticks() {
        let mut ts = FixedTimestep::default();
        assert_eq!(ts.advance(ms(50)), 1);
        assert_eq!(ts.accumulated(), Duration::ZERO);
    }

    #[test]
    fn at_most_one_tick_per_frame_by_default() {
        let mut ts = FixedTimestep::default();
        assert_eq!(ts.advance(ms(120)), 1);
        // Remaining backlog drains over the next frames.
        assert_eq!(ts.advance(Duration::ZERO), 1);
        assert_eq!(ts.advance(Duration::ZERO), 0);
        assert_eq!(ts.accumulated(), ms(20));
    }

    #[test]
    fn higher_cap_catches_up_in_one_frame() {
        let mut ts = FixedTimestep::default().with_max_ticks_per_frame(4).unwrap();
        assert_eq!(ts.advance(ms(160)), 3);
        assert_eq!(ts.accumulated(), ms(10));
    }

    #[test]
    fn backlog_is_capped() {
        let mut ts = FixedTimestep::default();
        ts.advance(Duration::from_secs(10));
        // One tick consumed from a 5-interval backlog.
        assert_eq!(ts.accumulated(), ms(200));

        let mut ts = FixedTimestep::default().with_max_backlog_ticks(2);
        ts.advance(Duration::from_secs(10));
        assert_eq!(ts.accumulated(), ms(50));
    }

    #[test]
    fn alpha_tracks_partial_progress() {
        let mut ts = FixedTimestep::default();
        assert_eq!(ts.alpha(), 0.0);
        ts.advance(ms(25));
        assert!((ts.alpha() - 0.5).abs() < 1e-6);
        ts.advance(ms(100));
        assert_eq!(ts.alpha(), 1.0);
    }

    #[test]
    fn reset_drops_accumulated_time() {
        let mut ts = FixedTimestep::default();
        ts.advance(ms(40));
        ts.reset();
        assert_eq!(ts.advance(ms(40)), 0);
    }
}
