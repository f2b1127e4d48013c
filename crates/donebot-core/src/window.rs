//! Nightly reminder window and logical-date policy.
//!
//! The window crosses midnight: with the default 19:00 start and 02:00
//! cutoff it is open from 19:00 through 02:00 the next calendar day, and
//! anything at or before the cutoff belongs to the previous evening.
//!
//! Both boundaries are inclusive.

use std::cell::Cell;

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Start and cutoff times of the nightly window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub start: NaiveTime,
    pub cutoff: NaiveTime,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
            cutoff: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
        }
    }
}

impl WindowPolicy {
    pub fn new(start: NaiveTime, cutoff: NaiveTime) -> Self {
        Self { start, cutoff }
    }

    /// `time >= start || time <= cutoff`.
    pub fn is_in_window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let time = now.time();
        time >= self.start || time <= self.cutoff
    }

    /// The evening `now` logically belongs to.
    pub fn target_date<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> NaiveDate {
        let date = now.date_naive();
        if now.time() <= self.cutoff {
            date.checked_sub_days(Days::new(1)).unwrap_or(date)
        } else {
            date
        }
    }
}

/// Civil time the window is evaluated in.
///
/// `Named` follows the zone's daylight-saving rules; `Fixed` pins a single
/// UTC offset all year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CivilZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Default for CivilZone {
    fn default() -> Self {
        CivilZone::Named(chrono_tz::America::Chicago)
    }
}

impl CivilZone {
    /// View an instant as local wall-clock time, carrying the offset in
    /// effect at that instant.
    pub fn localize<Z: TimeZone>(&self, instant: &DateTime<Z>) -> DateTime<FixedOffset> {
        match self {
            CivilZone::Named(tz) => {
                let local = instant.with_timezone(tz);
                local.with_timezone(&local.offset().fix())
            }
            CivilZone::Fixed(offset) => instant.with_timezone(offset),
        }
    }
}

/// Source of "now" in the configured civil zone.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock viewed in a [`CivilZone`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: CivilZone,
}

impl SystemClock {
    pub fn new(zone: CivilZone) -> Self {
        Self { zone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.zone.localize(&Utc::now())
    }
}

/// Clock pinned to a given local instant. Optionally moves forward by
/// `step` after every read, which lets tests observe that a value was
/// recomputed rather than reused.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<FixedOffset>>,
    step: Duration,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(now),
            step: Duration::zero(),
        }
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let current = self.now.get();
        self.now.set(current + self.step);
        current
    }
}
