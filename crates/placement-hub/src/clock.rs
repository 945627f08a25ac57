//! Identity sources and the settable clock used by tests and the demo walkthrough.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use mockable::Clock;

/// Calendar date the portal treats as "today" for deadlines and audit stamps.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.local().date_naive()
}

/// Clock pinned to midday of a settable date.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self(Mutex::new(today))
    }

    pub fn set(&self, today: NaiveDate) {
        *self.lock_date() = today;
    }

    fn lock_date(&self) -> MutexGuard<'_, NaiveDate> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn midday(&self) -> NaiveDateTime {
        self.lock_date().and_time(NaiveTime::MIN) + Duration::hours(12)
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        Local
            .from_local_datetime(&self.midday())
            .earliest()
            .unwrap_or_else(|| self.utc().with_timezone(&Local))
    }

    fn utc(&self) -> DateTime<Utc> {
        self.midday().and_utc()
    }
}

/// Issues identifiers for newly created catalog entities.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, prefix: &str) -> String;
}

/// Monotonic `prefix-000001` style identifiers, one counter per generator.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{id:06}")
    }
}
