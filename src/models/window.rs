//! Date and hour windows over a record's `time` column.

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// A calendar day, or a single hour of that day.
///
/// Stored timestamps are compared component-wise (year, month, day and hour)
/// exactly as stored. No timezone conversion happens, so callers must pass a
/// date in the same timezone as the stored data.
///
/// An hour outside `0..=23` is accepted and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    date: NaiveDate,
    hour: Option<i64>,
}

impl TimeWindow {
    /// Window covering a whole day.
    #[must_use]
    pub const fn day(date: NaiveDate) -> Self {
        Self { date, hour: None }
    }

    /// Window covering one hour of a day.
    #[must_use]
    pub const fn hour(date: NaiveDate, hour: i64) -> Self {
        Self {
            date,
            hour: Some(hour),
        }
    }

    /// Creates a window from a date and an optional hour.
    #[must_use]
    pub const fn new(date: NaiveDate, hour: Option<i64>) -> Self {
        Self { date, hour }
    }

    /// Parses a `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the date text is malformed.
    pub fn parse(date: &str, hour: Option<i64>) -> Result<Self> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
            Error::InvalidInput(format!("date '{date}' is not YYYY-MM-DD: {e}"))
        })?;
        Ok(Self::new(date, hour))
    }

    /// The calendar day.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The requested hour, if any.
    #[must_use]
    pub const fn hour_of_day(&self) -> Option<i64> {
        self.hour
    }

    /// Returns false when the hour is outside `0..=23`.
    #[must_use]
    pub const fn is_satisfiable(&self) -> bool {
        match self.hour {
            Some(h) => h >= 0 && h <= 23,
            None => true,
        }
    }

    /// Components the stored timestamp must equal: year, month, day and,
    /// for hour windows, the hour.
    #[must_use]
    pub fn components(&self) -> Vec<i64> {
        let mut parts = vec![
            i64::from(self.date.year()),
            i64::from(self.date.month()),
            i64::from(self.date.day()),
        ];
        if let Some(h) = self.hour {
            parts.push(h);
        }
        parts
    }

    /// Returns true if `time` falls inside the window.
    #[must_use]
    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        if time.date() != self.date {
            return false;
        }
        self.hour.is_none_or(|h| i64::from(time.hour()) == h)
    }

    /// Half-open `[start, end)` interval covered by the window.
    ///
    /// Returns `None` for an hour outside `0..=23`.
    #[must_use]
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match self.hour {
            None => {
                let start = self.date.and_time(NaiveTime::MIN);
                Some((start, start + Duration::days(1)))
            },
            Some(h) => {
                let hour = u32::try_from(h).ok()?;
                let start = self.date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?);
                Some((start, start + Duration::hours(1)))
            },
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hour {
            Some(h) => write!(f, "{} hour {h}", self.date),
            None => write!(f, "{}", self.date),
        }
    }
}
