use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, SubsecRound, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// Current time truncated to whole microseconds, the resolution the SQLite
/// store keeps.
pub(crate) fn now_micros(clock: &SharedClock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(6)
}

/// Clock that only moves when told to. Used to exercise session expiry.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_moves_only_when_advanced() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.utc(), start);

        clock.advance(TimeDelta::minutes(5));
        assert_eq!(clock.utc(), start + TimeDelta::minutes(5));

        clock.set(start);
        assert_eq!(clock.utc(), start);
    }
}
