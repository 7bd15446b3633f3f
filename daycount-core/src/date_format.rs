//! Date and time-of-day formats accepted at the input boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{DayCountError, DayCountResult};

/// The three date layouts users may type dates in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

impl DateFormat {
    pub const ALL: [DateFormat; 3] = [
        DateFormat::MonthDayYear,
        DateFormat::DayMonthYear,
        DateFormat::Iso,
    ];

    /// Human label, e.g. `MM/DD/YYYY`.
    pub const fn label(self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "MM/DD/YYYY",
            DateFormat::DayMonthYear => "DD/MM/YYYY",
            DateFormat::Iso => "YYYY-MM-DD",
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }

    /// Parse a date typed in this layout. Surrounding whitespace is ignored.
    pub fn parse(self, input: &str) -> DayCountResult<NaiveDate> {
        NaiveDate::parse_from_str(input.trim(), self.pattern()).map_err(|_| {
            DayCountError::InvalidDate {
                input: input.to_string(),
                expected: self.label().to_string(),
            }
        })
    }

    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MM/DD/YYYY" | "MDY" | "US" => Ok(DateFormat::MonthDayYear),
            "DD/MM/YYYY" | "DMY" | "EU" => Ok(DateFormat::DayMonthYear),
            "YYYY-MM-DD" | "YMD" | "ISO" => Ok(DateFormat::Iso),
            other => Err(format!(
                "Unknown date format '{}'. Use one of: {}",
                other,
                DateFormat::ALL.map(DateFormat::label).join(", ")
            )),
        }
    }
}

/// Parse a wall-clock time written as `HH:MM`.
pub fn parse_time_of_day(input: &str) -> DayCountResult<NaiveTime> {
    let trimmed = input.trim();
    let invalid = || DayCountError::InvalidTime(input.to_string());

    let (hours, minutes) = trimmed.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Parse an IANA timezone name such as `America/New_York`.
pub fn parse_timezone(name: &str) -> DayCountResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| DayCountError::InvalidTimezone(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_each_layout() {
        assert_eq!(
            DateFormat::MonthDayYear.parse("09/02/2025").unwrap(),
            date(2025, 9, 2)
        );
        assert_eq!(
            DateFormat::DayMonthYear.parse("02/09/2025").unwrap(),
            date(2025, 9, 2)
        );
        assert_eq!(
            DateFormat::Iso.parse(" 2025-09-02 ").unwrap(),
            date(2025, 9, 2)
        );
    }

    #[test]
    fn rejects_wrong_layout() {
        let err = DateFormat::Iso.parse("09/02/2025").unwrap_err();
        assert!(matches!(err, DayCountError::InvalidDate { .. }));
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(DateFormat::MonthDayYear.parse("02/30/2025").is_err());
        assert!(DateFormat::DayMonthYear.parse("31/04/2025").is_err());
        assert!(DateFormat::Iso.parse("2025-13-01").is_err());
        assert!(DateFormat::Iso.parse("").is_err());
    }

    #[test]
    fn accepts_leap_day_only_in_leap_years() {
        assert!(DateFormat::Iso.parse("2028-02-29").is_ok());
        assert!(DateFormat::Iso.parse("2027-02-29").is_err());
    }

    #[test]
    fn format_matches_layout() {
        let d = date(2026, 1, 1);
        assert_eq!(DateFormat::MonthDayYear.format(d), "01/01/2026");
        assert_eq!(DateFormat::DayMonthYear.format(d), "01/01/2026");
        assert_eq!(DateFormat::Iso.format(d), "2026-01-01");
    }

    #[test]
    fn from_str_accepts_labels_and_aliases() {
        assert_eq!(
            "MM/DD/YYYY".parse::<DateFormat>().unwrap(),
            DateFormat::MonthDayYear
        );
        assert_eq!(
            "dd/mm/yyyy".parse::<DateFormat>().unwrap(),
            DateFormat::DayMonthYear
        );
        assert_eq!("iso".parse::<DateFormat>().unwrap(), DateFormat::Iso);
        assert!("YYYY/MM/DD".parse::<DateFormat>().is_err());
    }

    #[test]
    fn time_of_day() {
        assert_eq!(
            parse_time_of_day("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day("23:59").unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
        assert!(parse_time_of_day("24:00").is_err());
        assert!(parse_time_of_day("12:60").is_err());
        assert!(parse_time_of_day("0930").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn timezone_names() {
        assert_eq!(
            parse_timezone("America/New_York").unwrap(),
            Tz::America__New_York
        );
        assert_eq!(parse_timezone(" UTC ").unwrap(), Tz::UTC);
        assert!(matches!(
            parse_timezone("Mars/Olympus_Mons"),
            Err(DayCountError::InvalidTimezone(_))
        ));
    }
}
