use std::time::{Duration, Instant};

pub const FIRST_YEAR: i32 = 2000;
pub const LAST_YEAR: i32 = 2019;
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Inclusive span of years the scrubber can show
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn new(first: i32, last: i32) -> Self {
        Self {
            first: first.min(last),
            last: first.max(last),
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn clamp(&self, year: i32) -> i32 {
        year.clamp(self.first, self.last)
    }

    /// Move by `delta` years without leaving the range
    pub fn step(&self, year: i32, delta: i32) -> i32 {
        self.clamp(year.saturating_add(delta))
    }

    /// Next year for auto-play: the last year wraps back to the first
    pub fn next_wrapping(&self, year: i32) -> i32 {
        if year < self.last {
            self.clamp(year + 1)
        } else {
            self.first
        }
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(FIRST_YEAR, LAST_YEAR)
    }
}

/// The single play/pause timer.
///
/// At most one deadline is ever armed: `play` drops the previous one before
/// arming, and `pause` drops it outright.
#[derive(Clone, Debug)]
pub struct PlayTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PlayTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn play(&mut self, now: Instant) {
        self.pause();
        self.next_due = Some(now + self.period);
    }

    pub fn pause(&mut self) {
        self.next_due = None;
    }

    /// Flip between playing and paused; returns the new playing state
    pub fn toggle(&mut self, now: Instant) -> bool {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
        self.is_playing()
    }

    /// Returns true once per elapsed period
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        // After a stall, restart the cadence instead of firing a burst
        let next = due + self.period;
        self.next_due = Some(if next <= now { now + self.period } else { next });
        true
    }
}

impl Default for PlayTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}
