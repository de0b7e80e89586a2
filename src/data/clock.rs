//! Time source for liveness and alert throttling.
//!
//! The registry and node state never read a clock themselves; callers pass in
//! a [`Timestamp`] taken from a [`Clock`]. Intervals (silence, tick spacing,
//! throttle windows) are measured on the monotonic reading only, so stepping
//! the wall clock neither hides a dead node nor fakes one. The wall reading is
//! kept for alert text and exports. Tests use [`ManualClock`].

use std::fmt::Debug;
use std::ops::Add;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeDelta};

/// Wall and monotonic time read together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Local time, for display only.
    pub wall: DateTime<Local>,
    /// Monotonic reading, for every interval comparison.
    pub mono: Instant,
}

impl Timestamp {
    /// Monotonic time elapsed since `earlier`; zero if `earlier` is later.
    pub fn since(&self, earlier: &Timestamp) -> Duration {
        self.mono.saturating_duration_since(earlier.mono)
    }
}

/// Moves both readings by `delta`. The monotonic reading never moves back.
impl Add<TimeDelta> for Timestamp {
    type Output = Timestamp;

    fn add(self, delta: TimeDelta) -> Timestamp {
        let mono = delta
            .to_std()
            .ok()
            .and_then(|d| self.mono.checked_add(d))
            .unwrap_or(self.mono);
        Timestamp {
            wall: self.wall + delta,
            mono,
        }
    }
}

/// A source of the current time.
pub trait Clock: Send + Debug {
    fn now(&self) -> Timestamp;

    fn instant(&self) -> Instant {
        self.now().mono
    }
}

/// The system clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp {
            wall: Local::now(),
            mono: Instant::now(),
        }
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Let `delta` of time pass on both readings.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + delta;
    }

    /// Step the wall clock to `at` without any time passing.
    pub fn set_wall(&self, at: DateTime<Local>) {
        self.now.lock().unwrap_or_else(|e| e.into_inner()).wall = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A timestamp at `h:m:s` on a fixed test day. The monotonic reading is
/// derived from the same time of day, so stamps built separately compare
/// consistently.
#[cfg(test)]
pub(crate) fn test_time(h: u32, m: u32, s: u32) -> Timestamp {
    use chrono::TimeZone;
    use std::sync::OnceLock;

    static BASE: OnceLock<Instant> = OnceLock::new();
    let base = *BASE.get_or_init(Instant::now);

    let wall = Local
        .with_ymd_and_hms(2024, 6, 12, h, m, s)
        .single()
        .expect("unambiguous local time");
    let secs = u64::from(h) * 3_600 + u64::from(m) * 60 + u64::from(s);
    Timestamp {
        wall,
        mono: base + Duration::from_secs(secs),
    }
}
