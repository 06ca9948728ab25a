use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

/// Source of "now" for strategies and the tick loop.
///
/// Nothing that takes part in a trading decision may read the wall clock
/// directly; live runs use `SystemClock`, replays use `FrozenClock`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Simulated time that only changes through `advance`.
#[derive(Debug)]
pub struct FrozenClock {
    now: Mutex<DateTime<Utc>>,
}

impl FrozenClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move simulated time forward and return the new value.
    /// Negative durations are rejected; the clock never goes backward.
    pub fn advance(&self, by: Duration) -> Result<DateTime<Utc>> {
        if by < Duration::zero() {
            return Err(Error::Config(format!(
                "frozen clock cannot move backward (by {by})"
            )));
        }
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let next = now
            .checked_add_signed(by)
            .ok_or_else(|| Error::Config(format!("advancing clock by {by} overflows")))?;
        *now = next;
        Ok(next)
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
