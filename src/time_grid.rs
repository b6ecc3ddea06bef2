//! Discretized trip time: weekdays, trip days, and hourly slots.
//!
//! A trip day is a 1-based index into the trip. It maps onto the 7-valued
//! weekday cycle relative to the start weekday, and onto calendar time
//! relative to a fixed epoch date (trip day 1 = epoch).

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TimeGridError};

/// Number of hourly slots in a day.
pub const SLOTS_PER_DAY: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Position in the week, Monday = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Weekday {
        Self::ALL[index % 7]
    }

    /// The following weekday, wrapping Sunday to Monday.
    pub fn next(self) -> Weekday {
        Self::from_index(self.index() + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownWeekday(s.to_string()))
    }
}

/// 1-based day within the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripDay(u32);

impl TripDay {
    pub const FIRST: TripDay = TripDay(1);

    pub fn new(day: i64) -> Result<Self, TimeGridError> {
        match u32::try_from(day) {
            Ok(value) if value >= 1 => Ok(Self(value)),
            _ => Err(TimeGridError::InvalidDay(day)),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The trip day `n` days later.
    pub fn offset(self, n: u32) -> TripDay {
        TripDay(self.0 + n)
    }
}

impl fmt::Display for TripDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day{}", self.0)
    }
}

/// Hour-of-day slot, `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u8);

impl Slot {
    pub fn new(hour: i64) -> Result<Self, TimeGridError> {
        match u8::try_from(hour) {
            Ok(value) if value < SLOTS_PER_DAY => Ok(Self(value)),
            _ => Err(TimeGridError::InvalidSlot(hour)),
        }
    }

    pub fn hour(self) -> u8 {
        self.0
    }

    /// Successor within the same day; slot 23 has none.
    pub fn next(self) -> Option<Slot> {
        (self.0 + 1 < SLOTS_PER_DAY).then_some(Slot(self.0 + 1))
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (0..SLOTS_PER_DAY).map(Slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts_{}", self.0)
    }
}

/// Weekday of a trip day given the weekday the trip starts on.
pub fn weekday_for(start: Weekday, day: TripDay) -> Weekday {
    Weekday::from_index(start.index() + (day.get() as usize - 1))
}

/// Maps trip-relative (day, slot) pairs onto calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    epoch: NaiveDate,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
        }
    }
}

impl TimeGrid {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Epoch + (day - 1) days, at `slot:00:00`.
    pub fn absolute_time(&self, day: TripDay, slot: Slot) -> NaiveDateTime {
        self.epoch.and_time(NaiveTime::MIN)
            + Duration::days(i64::from(day.get()) - 1)
            + Duration::hours(i64::from(slot.hour()))
    }

    /// Same as [`TimeGrid::absolute_time`] for unchecked integers.
    pub fn at(&self, day: i64, hour: i64) -> Result<NaiveDateTime, TimeGridError> {
        Ok(self.absolute_time(TripDay::new(day)?, Slot::new(hour)?))
    }
}
