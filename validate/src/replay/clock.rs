//! Virtual clock for replay timing simulation
//!
//! Supports two replay modes:
//! - Realtime (1x speed): Sleep between frames so cues can be watched live
//! - Accelerated: Instant replay with virtual time tracking
//!
//! Other multipliers (0.5x slow-mo, 10x fast-forward) work the same way.

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use std::time::Duration;

/// Virtual clock that maps script time to wall time
#[derive(Debug)]
pub struct VirtualClock {
    /// Script start (t = 0)
    start: NaiveDateTime,

    /// Current simulated time
    current: NaiveDateTime,

    /// Speed multiplier (1.0 = realtime, 0.0 = instant, 10.0 = 10x speed)
    speed_multiplier: f32,
}

impl VirtualClock {
    pub fn new(start: NaiveDateTime, speed_multiplier: f32) -> Self {
        Self {
            start,
            current: start,
            speed_multiplier,
        }
    }

    /// Create a clock for instant (accelerated) replay
    pub fn instant(start: NaiveDateTime) -> Self {
        Self::new(start, 0.0)
    }

    /// Create a clock for realtime (1x) replay
    pub fn realtime(start: NaiveDateTime) -> Self {
        Self::new(start, 1.0)
    }

    /// Advance to `secs` after start, sleeping unless in instant mode.
    /// Returns the new current time.
    pub fn advance_to_secs(&mut self, secs: f32) -> NaiveDateTime {
        let target = self.start + ChronoDuration::milliseconds((secs * 1000.0).round() as i64);
        self.advance_to(target);
        target
    }

    /// Advance the clock to a specific time, optionally sleeping
    pub fn advance_to(&mut self, time: NaiveDateTime) {
        if self.speed_multiplier > 0.0 && time > self.current {
            let delta_ms = (time - self.current).num_milliseconds().max(0) as f32;
            let sleep_ms = (delta_ms / self.speed_multiplier) as u64;

            if sleep_ms > 0 {
                std::thread::sleep(Duration::from_millis(sleep_ms));
            }
        }

        self.current = time;
    }

    /// Seconds since start
    pub fn elapsed_secs(&self) -> f32 {
        (self.current - self.start).num_milliseconds() as f32 / 1000.0
    }

    /// Format elapsed time as MM:SS.ms
    pub fn format_elapsed(&self) -> String {
        let secs = self.elapsed_secs();
        let mins = (secs / 60.0).floor() as u32;
        format!("{:02}:{:05.2}", mins, secs % 60.0)
    }

    pub fn is_instant_mode(&self) -> bool {
        self.speed_multiplier == 0.0
    }

    pub fn speed(&self) -> f32 {
        self.speed_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_time(hour: u32, min: u32, sec: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_milli_opt(hour, min, sec, ms)
            .unwrap()
    }

    #[test]
    fn test_elapsed() {
        let mut clock = VirtualClock::instant(make_time(12, 0, 0, 0));
        assert_eq!(clock.elapsed_secs(), 0.0);

        clock.advance_to(make_time(12, 0, 30, 0));
        assert_eq!(clock.elapsed_secs(), 30.0);

        let now = clock.advance_to_secs(75.5);
        assert_eq!(now, make_time(12, 1, 15, 500));
        assert!((clock.elapsed_secs() - 75.5).abs() < 0.001);
    }

    #[test]
    fn test_format_elapsed() {
        let mut clock = VirtualClock::instant(make_time(12, 0, 0, 0));

        clock.advance_to(make_time(12, 0, 15, 230));
        assert_eq!(clock.format_elapsed(), "00:15.23");

        clock.advance_to(make_time(12, 2, 45, 500));
        assert_eq!(clock.format_elapsed(), "02:45.50");
    }

    #[test]
    fn test_modes() {
        let clock = VirtualClock::instant(make_time(12, 0, 0, 0));
        assert!(clock.is_instant_mode());

        let clock = VirtualClock::realtime(make_time(12, 0, 0, 0));
        assert!(!clock.is_instant_mode());
        assert_eq!(clock.speed(), 1.0);
    }
}
