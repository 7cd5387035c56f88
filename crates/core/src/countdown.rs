use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Time left until the target instant, split into calendar-free units.
///
/// `days` is unbounded; the sub-day fields are already reduced, so
/// `hours < 24`, `minutes < 60` and `seconds < 60` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Remaining {
    /// Collapse back to a flat second count.
    pub fn total_seconds(&self) -> u64 {
        self.days * SECS_PER_DAY as u64
            + self.hours as u64 * SECS_PER_HOUR as u64
            + self.minutes as u64 * SECS_PER_MINUTE as u64
            + self.seconds as u64
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Result of comparing the clock against the target instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Countdown {
    Remaining(Remaining),
    Passed,
}

impl Countdown {
    /// Evaluate the countdown at `now`.
    ///
    /// The target counts as reached the moment `now >= target`, so a
    /// sub-second gap on the wrong side never reports a phantom day.
    pub fn evaluate(now: NaiveDateTime, target: NaiveDateTime) -> Self {
        if now >= target {
            return Countdown::Passed;
        }
        let total = (target - now).num_seconds();
        let rest = total % SECS_PER_DAY;
        Countdown::Remaining(Remaining {
            days: (total / SECS_PER_DAY) as u64,
            hours: (rest / SECS_PER_HOUR) as u8,
            minutes: (rest % SECS_PER_HOUR / SECS_PER_MINUTE) as u8,
            seconds: (rest % SECS_PER_MINUTE) as u8,
        })
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Countdown::Passed)
    }

    pub fn remaining(&self) -> Option<Remaining> {
        match self {
            Countdown::Remaining(r) => Some(*r),
            Countdown::Passed => None,
        }
    }
}
