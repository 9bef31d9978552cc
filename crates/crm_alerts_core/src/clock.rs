//! Injectable evaluation clock.
//!
//! Alert classification depends on "now" and on the caller's calendar day,
//! so the engine reads both from a `Clock` instead of the wall clock.

use chrono::{DateTime, FixedOffset, Local, TimeZone};

/// Source of the evaluation instant.
///
/// The instant's time zone defines calendar-day boundaries for due-date
/// buckets. Zones with DST transitions must be carried as a real zone, not
/// as the offset in effect at `now`.
pub trait Clock: Send + Sync {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// Local wall clock in the process time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to one instant in a given zone. Used by tests and replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock<Tz: TimeZone = FixedOffset>(pub DateTime<Tz>);

impl<Tz> Clock for FixedClock<Tz>
where
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
{
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.0.clone()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    type Tz = C::Tz;

    fn now(&self) -> DateTime<C::Tz> {
        (**self).now()
    }
}
