//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Midnight UTC on the first day of this timestamp's calendar month.
    ///
    /// Token allowances are metered per calendar month, so this is the
    /// lower bound of the current usage period.
    pub fn start_of_month(&self) -> Self {
        Self::midnight(first_of_month(self.0.year(), self.0.month()))
    }

    /// Midnight UTC on the first day of the following calendar month.
    pub fn start_of_next_month(&self) -> Self {
        let (year, month) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        Self::midnight(first_of_month(year, month))
    }

    /// Returns the calendar date (UTC) of this timestamp.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    fn midnight(date: NaiveDate) -> Self {
        Self(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day 1 exists in every month of every representable year.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap())
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn ordering_helpers_agree() {
        let earlier = at(2024, 3, 1, 0);
        let later = at(2024, 3, 2, 0);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert_eq!(earlier.add_days(1), later);
        assert_eq!(later.minus_days(1), earlier);
    }

    #[test]
    fn start_of_month_truncates_to_midnight_on_the_first() {
        let ts = at(2024, 5, 17, 13).start_of_month();
        assert_eq!(ts.as_datetime().day(), 1);
        assert_eq!(ts.as_datetime().month(), 5);
        assert_eq!(ts.as_datetime().hour(), 0);
        assert_eq!(ts.as_datetime().minute(), 0);
    }

    #[test]
    fn start_of_next_month_rolls_over_year_end() {
        let ts = at(2024, 12, 31, 23).start_of_next_month();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn start_of_next_month_mid_year() {
        let ts = at(2024, 2, 29, 8).start_of_next_month();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
