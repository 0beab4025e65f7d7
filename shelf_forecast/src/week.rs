//! ISO calendar week identifiers
//!
//! A week renders as `YYYY-Www` (e.g. `2023-W07`). Because both parts are
//! zero-padded, lexicographic order of the labels equals calendar order.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Weekday};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One ISO week, represented by its Monday
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekId {
    monday: NaiveDate,
}

impl WeekId {
    /// The ISO week containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        let offset = date.weekday().num_days_from_monday() as i64;
        Self {
            monday: date - Duration::days(offset),
        }
    }

    /// The ISO week containing a Unix timestamp in milliseconds (UTC)
    pub fn from_timestamp_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|dt| Self::from_date(dt.date_naive()))
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    /// ISO week-numbering year
    pub fn year(&self) -> i32 {
        self.monday.iso_week().year()
    }

    /// ISO week number, 1..=53
    pub fn week(&self) -> u32 {
        self.monday.iso_week().week()
    }

    /// The week `weeks` weeks later
    pub fn plus_weeks(&self, weeks: i64) -> Self {
        Self {
            monday: self.monday + Duration::weeks(weeks),
        }
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year(), self.week())
    }
}

impl FromStr for WeekId {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ForecastError::DataError(format!("invalid week identifier: {:?}", s));

        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;

        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|monday| Self { monday })
            .ok_or_else(invalid)
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_parse() {
        let week = WeekId::from_date(NaiveDate::from_ymd_opt(2023, 2, 15).unwrap());
        assert_eq!(week.to_string(), "2023-W07");
        assert_eq!("2023-W07".parse::<WeekId>().unwrap(), week);
        assert_eq!(week.monday(), NaiveDate::from_ymd_opt(2023, 2, 13).unwrap());
    }

    #[test]
    fn test_iso_year_boundary() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020
        let week = WeekId::from_date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(week.to_string(), "2020-W53");
        assert_eq!(week.plus_weeks(1).to_string(), "2021-W01");
    }

    #[test]
    fn test_from_timestamp() {
        // 2023-02-15T12:00:00Z
        let week = WeekId::from_timestamp_millis(1_676_462_400_000).unwrap();
        assert_eq!(week.to_string(), "2023-W07");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["2023-7", "2023-W7", "23-W07", "2023-W54", "abcd-Wxy"] {
            assert!(bad.parse::<WeekId>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_label_order_matches_calendar_order() {
        let a = WeekId::from_date(NaiveDate::from_ymd_opt(2022, 12, 28).unwrap());
        let b = a.plus_weeks(2);
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }
}
