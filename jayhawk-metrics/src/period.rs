//! Reporting periods

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MetricsError;

/// Granularity rows are bucketed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Start of the period containing `timestamp`. Weeks start on Monday.
    pub fn truncate(&self, timestamp: NaiveDateTime) -> NaiveDate {
        let date = timestamp.date();
        match self {
            Period::Day => date,
            Period::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Period::Month => date.with_day(1).unwrap_or(date),
            Period::Year => date.with_ordinal(1).unwrap_or(date),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(MetricsError::InvalidPeriod(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(17, 45, 3)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_truncate() {
        // 2020-03-05 is a Thursday
        let ts = at(2020, 3, 5);
        assert_eq!(Period::Day.truncate(ts), date(2020, 3, 5));
        assert_eq!(Period::Week.truncate(ts), date(2020, 3, 2));
        assert_eq!(Period::Month.truncate(ts), date(2020, 3, 1));
        assert_eq!(Period::Year.truncate(ts), date(2020, 1, 1));
    }

    #[test]
    fn test_week_crosses_year_boundary() {
        // 2021-01-01 is a Friday, its week started in 2020
        assert_eq!(Period::Week.truncate(at(2021, 1, 1)), date(2020, 12, 28));
        // Mondays truncate to themselves
        assert_eq!(Period::Week.truncate(at(2020, 12, 28)), date(2020, 12, 28));
    }

    #[test]
    fn test_parse() {
        assert_eq!("month".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        assert!(matches!(
            "fortnight".parse::<Period>(),
            Err(MetricsError::InvalidPeriod(_))
        ));
        assert_eq!(Period::default(), Period::Month);
    }
}
