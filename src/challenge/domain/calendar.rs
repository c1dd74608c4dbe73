//! Calendar-day utilities: instant truncation, half-open day ranges, and
//! weekday bit positions.
//!
//! The challenge core never reasons about time below day granularity. Every
//! instant entering the domain is truncated here, and all date arithmetic
//! goes through [`DayRange`] so the `[start, end)` boundary convention lives
//! in one place.

use super::error::ChallengeDomainError;
use chrono::{DateTime, Days, NaiveDate, Utc, Weekday};

/// Truncates an instant to its UTC calendar day.
#[must_use]
pub fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Returns the mask bit position for a weekday, with Sunday at bit zero.
#[must_use]
pub const fn weekday_bit(weekday: Weekday) -> u8 {
    1 << weekday.num_days_from_sunday()
}

/// Half-open range of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    /// Creates a day range.
    ///
    /// An empty range (`start == end`) is valid and iterates zero days.
    ///
    /// # Errors
    ///
    /// Returns [`ChallengeDomainError::InvertedDayRange`] when `end`
    /// precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ChallengeDomainError> {
        if end < start {
            return Err(ChallengeDomainError::InvertedDayRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates the range `[start, start + days)`.
    #[must_use]
    pub fn from_start_and_days(start: NaiveDate, days: u8) -> Self {
        Self {
            start,
            end: start + Days::new(u64::from(days)),
        }
    }

    /// Returns the first day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Returns the exclusive end day of the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns whether the given day falls within the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Returns the number of days spanned by the range.
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::try_from((self.end - self.start).num_days()).unwrap_or_default()
    }

    /// Returns whether the range spans no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterates each day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }
}
