//! Frame timing.
//!
//! [`GameTime`] is the value handed to update subscribers. The lifecycle hub
//! never looks inside it; only the host loop's [`FrameClock`] produces it.

use instant::{Duration, Instant};

/// Elapsed/total time pair for one update tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTime {
    elapsed: Duration,
    total: Duration,
}

impl GameTime {
    pub const ZERO: GameTime = GameTime {
        elapsed: Duration::ZERO,
        total: Duration::ZERO,
    };

    pub fn new(elapsed: Duration, total: Duration) -> Self {
        Self { elapsed, total }
    }

    /// Time since the previous tick.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time since the clock started.
    pub fn total(&self) -> Duration {
        self.total
    }
}

/// Produces [`GameTime`] values and keeps per-second frame statistics.
///
/// FPS is sampled once a second of game time has passed since the previous
/// sample; in between, [`fps`](Self::fps) reports the last sample.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Option<Instant>,
    current: GameTime,
    frames: u64,
    frames_since_sample: u32,
    last_sample_ms: u128,
    fps: f64,
}

impl FrameClock {
    const SAMPLE_WINDOW_MS: u128 = 1000;

    pub fn new(start: Instant) -> Self {
        Self {
            start,
            last: None,
            current: GameTime::ZERO,
            frames: 0,
            frames_since_sample: 0,
            last_sample_ms: 0,
            fps: 0.0,
        }
    }

    /// Advance the clock to `now` and return the time of this tick.
    ///
    /// The first tick has a zero elapsed time. `now` earlier than the previous
    /// tick saturates to zero instead of going backwards.
    pub fn tick(&mut self, now: Instant) -> GameTime {
        let elapsed = match self.last {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        let total = now.saturating_duration_since(self.start);
        self.last = Some(now);
        self.current = GameTime::new(elapsed, total);

        self.frames += 1;
        self.frames_since_sample += 1;
        let total_ms = total.as_millis();
        if total_ms.saturating_sub(self.last_sample_ms) >= Self::SAMPLE_WINDOW_MS {
            self.last_sample_ms = total_ms;
            self.fps = self.frames_since_sample as f64;
            self.frames_since_sample = 0;
        }
        self.current
    }

    /// The time produced by the latest tick.
    pub fn current(&self) -> GameTime {
        self.current
    }

    /// Instant of the latest tick, or the start instant before any tick.
    pub fn last_time(&self) -> Instant {
        self.last.unwrap_or(self.start)
    }

    pub fn total_frames(&self) -> u64 {
        self.frames
    }

    pub fn delta_seconds(&self) -> f32 {
        self.current.elapsed.as_secs_f32()
    }

    pub fn elapsed_milliseconds(&self) -> u128 {
        self.current.total.as_millis()
    }

    pub fn fps(&self) -> u32 {
        self.fps as u32
    }

    pub fn fps_precise(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_no_elapsed_time() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let time = clock.tick(start + Duration::from_millis(5));
        assert_eq!(time.elapsed(), Duration::ZERO);
        assert_eq!(time.total(), Duration::from_millis(5));
        assert_eq!(clock.total_frames(), 1);
    }

    #[test]
    fn elapsed_is_distance_between_ticks() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        clock.tick(start);
        let time = clock.tick(start + Duration::from_millis(16));
        assert_eq!(time.elapsed(), Duration::from_millis(16));
        assert_eq!(clock.elapsed_milliseconds(), 16);
        assert!((clock.delta_seconds() - 0.016).abs() < 1e-6);
    }

    #[test]
    fn fps_is_sampled_once_per_second() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        // 60 ticks at 10ms, then one tick past the one-second mark.
        for i in 0..60 {
            clock.tick(start + Duration::from_millis(i * 10));
        }
        assert_eq!(clock.fps(), 0);
        clock.tick(start + Duration::from_millis(1000));
        assert_eq!(clock.fps(), 61);
        assert_eq!(clock.fps_precise(), 61.0);

        clock.tick(start + Duration::from_millis(1500));
        assert_eq!(clock.fps(), 61, "keeps the last sample until the next window closes");
        clock.tick(start + Duration::from_millis(2000));
        assert_eq!(clock.fps(), 2);
    }
}
