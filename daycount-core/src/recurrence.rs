//! RRULE recurrence rules (RFC 5545 §3.3.10).
//!
//! Rules are only described, never expanded: this module parses the textual
//! shorthand users type, checks it against the RFC constraints that matter for
//! a single repeating event, and renders it back in a canonical order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{DayCountError, DayCountResult};

const RRULE_PREFIX: &str = "RRULE:";
const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Longest possible length of each month, leap years included.
const MAX_MONTH_LENGTH: [i8; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DayCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            "SECONDLY" | "MINUTELY" | "HOURLY" => Err(DayCountError::InvalidRule(format!(
                "FREQ={} is not supported, use DAILY, WEEKLY, MONTHLY or YEARLY",
                s.trim().to_ascii_uppercase()
            ))),
            _ => Err(DayCountError::InvalidRule(format!("unknown frequency '{}'", s.trim()))),
        }
    }
}

/// Day of the week as used by BYDAY and WKST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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
    /// Two-letter RFC 5545 code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "MO",
            Weekday::Tuesday => "TU",
            Weekday::Wednesday => "WE",
            Weekday::Thursday => "TH",
            Weekday::Friday => "FR",
            Weekday::Saturday => "SA",
            Weekday::Sunday => "SU",
        }
    }

    fn parse(code: &str) -> Option<Self> {
        Some(match code.to_ascii_uppercase().as_str() {
            "MO" => Weekday::Monday,
            "TU" => Weekday::Tuesday,
            "WE" => Weekday::Wednesday,
            "TH" => Weekday::Thursday,
            "FR" => Weekday::Friday,
            "SA" => Weekday::Saturday,
            "SU" => Weekday::Sunday,
            _ => return None,
        })
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BYDAY entry: a weekday, optionally with an ordinal.
///
/// - `MO`: every Monday
/// - `1MO`: first Monday of the month (or year)
/// - `-1FR`: last Friday of the month (or year)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayNum {
    /// Occurrence within the period, -53..=53 excluding 0.
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub const fn every(weekday: Weekday) -> Self {
        WeekdayNum {
            ordinal: None,
            weekday,
        }
    }

    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        WeekdayNum {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        f.write_str(self.weekday.as_str())
    }
}

impl FromStr for WeekdayNum {
    type Err = DayCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DayCountError::InvalidRule(format!("invalid BYDAY value '{s}'"));

        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (ordinal, code) = s.split_at(split);
        let weekday = Weekday::parse(code).ok_or_else(invalid)?;

        let ordinal = if ordinal.is_empty() {
            None
        } else {
            Some(ordinal.parse::<i8>().map_err(|_| invalid())?)
        };

        Ok(WeekdayNum { ordinal, weekday })
    }
}

/// How a recurrence ends. Exactly one of these holds for any rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    #[default]
    Unbounded,
    /// Total number of occurrences, at least 1.
    Count(u32),
    /// Last instant an occurrence may start at.
    Until(DateTime<Utc>),
}

/// A validated-on-demand recurrence rule for a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub terminator: Terminator,
    pub by_day: Vec<WeekdayNum>,
    pub by_month_day: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_set_pos: Vec<i16>,
    pub week_start: Option<Weekday>,
}

impl RecurrenceRule {
    /// A bare rule repeating every period with no end.
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            interval: 1,
            terminator: Terminator::Unbounded,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: None,
        }
    }

    /// Build a rule from the simple repeat options: frequency, interval and an
    /// optional count or last date. The last date is taken as midnight UTC.
    pub fn preset(
        frequency: Frequency,
        interval: u32,
        count: Option<u32>,
        until: Option<NaiveDate>,
    ) -> DayCountResult<Self> {
        let terminator = match (count, until) {
            (Some(_), Some(_)) => return Err(DayCountError::CountAndUntil),
            (Some(n), None) => Terminator::Count(n),
            (None, Some(date)) => Terminator::Until(date.and_time(NaiveTime::MIN).and_utc()),
            (None, None) => Terminator::Unbounded,
        };

        let rule = RecurrenceRule {
            interval,
            terminator,
            ..RecurrenceRule::new(frequency)
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Parse rule shorthand such as `FREQ=DAILY;COUNT=10`, with or without a
    /// leading `RRULE:`.
    pub fn parse(input: &str) -> DayCountResult<Self> {
        let body = strip_rrule_prefix(input.trim());
        if body.trim().is_empty() {
            return Err(DayCountError::InvalidRule("rule is empty".into()));
        }

        let mut seen: Vec<String> = Vec::new();
        let mut frequency = None;
        let mut interval = 1;
        let mut count = None;
        let mut until = None;
        let mut by_day = Vec::new();
        let mut by_month_day = Vec::new();
        let mut by_month = Vec::new();
        let mut by_set_pos = Vec::new();
        let mut week_start = None;

        for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                DayCountError::InvalidRule(format!("expected NAME=VALUE, got '{part}'"))
            })?;
            let name = name.trim().to_ascii_uppercase();
            let value = value.trim();

            if seen.contains(&name) {
                return Err(DayCountError::InvalidRule(format!("{name} appears more than once")));
            }
            if value.is_empty() {
                return Err(DayCountError::InvalidRule(format!("{name} has no value")));
            }

            match name.as_str() {
                "FREQ" => frequency = Some(value.parse::<Frequency>()?),
                "INTERVAL" => interval = parse_number(&name, value)?,
                "COUNT" => count = Some(parse_number::<u32>(&name, value)?),
                "UNTIL" => until = Some(parse_until(value)?),
                "BYDAY" => by_day = parse_list(value, str::parse::<WeekdayNum>)?,
                "BYMONTHDAY" => by_month_day = parse_list(value, |v| parse_number(&name, v))?,
                "BYMONTH" => by_month = parse_list(value, |v| parse_number(&name, v))?,
                "BYSETPOS" => by_set_pos = parse_list(value, |v| parse_number(&name, v))?,
                "WKST" => {
                    week_start = Some(Weekday::parse(value).ok_or_else(|| {
                        DayCountError::InvalidRule(format!("invalid WKST value '{value}'"))
                    })?)
                }
                _ => {
                    return Err(DayCountError::InvalidRule(format!(
                        "unsupported rule part '{name}'"
                    )));
                }
            }
            seen.push(name);
        }

        let frequency =
            frequency.ok_or_else(|| DayCountError::InvalidRule("FREQ is required".into()))?;

        let terminator = match (count, until) {
            (Some(_), Some(_)) => return Err(DayCountError::CountAndUntil),
            (Some(n), None) => Terminator::Count(n),
            (None, Some(instant)) => Terminator::Until(instant),
            (None, None) => Terminator::Unbounded,
        };

        let rule = RecurrenceRule {
            frequency,
            interval,
            terminator,
            by_day,
            by_month_day,
            by_month,
            by_set_pos,
            week_start,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Check the rule against the RFC 5545 constraints.
    pub fn validate(&self) -> DayCountResult<()> {
        if self.interval == 0 {
            return Err(DayCountError::InvalidRule("INTERVAL must be at least 1".into()));
        }
        if self.terminator == Terminator::Count(0) {
            return Err(DayCountError::InvalidRule("COUNT must be at least 1".into()));
        }

        for day in &self.by_day {
            if let Some(n) = day.ordinal {
                if n == 0 || !(-53..=53).contains(&n) {
                    return Err(DayCountError::InvalidRule(format!(
                        "BYDAY ordinal {n} must be between -53 and 53 and not 0"
                    )));
                }
                if !matches!(self.frequency, Frequency::Monthly | Frequency::Yearly) {
                    return Err(DayCountError::InvalidRule(format!(
                        "BYDAY={day} needs FREQ=MONTHLY or FREQ=YEARLY"
                    )));
                }
            }
        }

        for month in &self.by_month {
            if !(1..=12).contains(month) {
                return Err(DayCountError::InvalidRule(format!(
                    "BYMONTH {month} must be between 1 and 12"
                )));
            }
        }

        if !self.by_month_day.is_empty() && self.frequency == Frequency::Weekly {
            return Err(DayCountError::InvalidRule(
                "BYMONTHDAY cannot be used with FREQ=WEEKLY".into(),
            ));
        }
        for day in &self.by_month_day {
            if *day == 0 || !(-31..=31).contains(day) {
                return Err(DayCountError::InvalidRule(format!(
                    "BYMONTHDAY {day} must be between -31 and 31 and not 0"
                )));
            }
            if !self.month_can_hold(*day) {
                return Err(DayCountError::InvalidRule(format!(
                    "BYMONTHDAY {day} never falls in the selected months"
                )));
            }
        }

        for pos in &self.by_set_pos {
            if *pos == 0 || !(-366..=366).contains(pos) {
                return Err(DayCountError::InvalidRule(format!(
                    "BYSETPOS {pos} must be between -366 and 366 and not 0"
                )));
            }
        }
        if !self.by_set_pos.is_empty()
            && self.by_day.is_empty()
            && self.by_month_day.is_empty()
            && self.by_month.is_empty()
        {
            return Err(DayCountError::InvalidRule(
                "BYSETPOS needs another BYxxx part to select from".into(),
            ));
        }

        Ok(())
    }

    fn month_can_hold(&self, day: i8) -> bool {
        let reach = day.abs();
        if self.by_month.is_empty() {
            return reach <= 31;
        }
        self.by_month
            .iter()
            .filter_map(|m| MAX_MONTH_LENGTH.get(usize::from(*m).wrapping_sub(1)))
            .any(|len| reach <= *len)
    }

    /// Render the rule value (no `RRULE:` prefix).
    ///
    /// With `all_day`, UNTIL is written as a DATE so the rule carries no
    /// time-of-day, matching a `VALUE=DATE` start.
    pub fn to_value(&self, all_day: bool) -> String {
        let mut parts = vec![format!("FREQ={}", self.frequency)];

        if self.interval != 1 {
            parts.push(format!("INTERVAL={}", self.interval));
        }

        match self.terminator {
            Terminator::Unbounded => {}
            Terminator::Count(n) => parts.push(format!("COUNT={n}")),
            Terminator::Until(instant) if all_day => {
                parts.push(format!("UNTIL={}", instant.format("%Y%m%d")))
            }
            Terminator::Until(instant) => {
                parts.push(format!("UNTIL={}Z", instant.format(UNTIL_FORMAT)))
            }
        }

        if !self.by_month.is_empty() {
            parts.push(format!("BYMONTH={}", join(&self.by_month)));
        }
        if !self.by_month_day.is_empty() {
            parts.push(format!("BYMONTHDAY={}", join(&self.by_month_day)));
        }
        if !self.by_day.is_empty() {
            parts.push(format!("BYDAY={}", join(&self.by_day)));
        }
        if !self.by_set_pos.is_empty() {
            parts.push(format!("BYSETPOS={}", join(&self.by_set_pos)));
        }
        if let Some(day) = self.week_start {
            parts.push(format!("WKST={day}"));
        }

        parts.join(";")
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value(false))
    }
}

impl FromStr for RecurrenceRule {
    type Err = DayCountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecurrenceRule::parse(s)
    }
}

fn strip_rrule_prefix(input: &str) -> &str {
    match input.get(..RRULE_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(RRULE_PREFIX) => &input[RRULE_PREFIX.len()..],
        _ => input,
    }
}

/// Parse an UNTIL value. Only UTC date-times (`YYYYMMDDTHHMMSSZ`) are accepted.
fn parse_until(value: &str) -> DayCountResult<DateTime<Utc>> {
    let local = value
        .strip_suffix('Z')
        .ok_or_else(|| DayCountError::UntilNotUtc(value.to_string()))?;

    NaiveDateTime::parse_from_str(local, UNTIL_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| DayCountError::UntilNotUtc(value.to_string()))
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> DayCountResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DayCountError::InvalidRule(format!("invalid {name} value '{value}'")))
}

fn parse_list<T, F>(value: &str, parse: F) -> DayCountResult<Vec<T>>
where
    F: Fn(&str) -> DayCountResult<T>,
{
    value.split(',').map(|item| parse(item.trim())).collect()
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prefixed_and_bare_rules_are_identical() {
        let prefixed = RecurrenceRule::parse("RRULE:FREQ=DAILY;COUNT=10").unwrap();
        let bare = RecurrenceRule::parse("FREQ=DAILY;COUNT=10").unwrap();
        assert_eq!(prefixed, bare);
        assert_eq!(prefixed.to_string(), "FREQ=DAILY;COUNT=10");
        assert_eq!(bare.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn prefix_is_case_insensitive_and_trimmed() {
        let rule = RecurrenceRule::parse("  rrule:freq=weekly;interval=2  ").unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;INTERVAL=2");
    }

    #[test]
    fn count_and_until_together_are_rejected() {
        let err = RecurrenceRule::parse("FREQ=DAILY;COUNT=5;UNTIL=20261231T000000Z").unwrap_err();
        assert!(matches!(err, DayCountError::CountAndUntil));

        let err = RecurrenceRule::preset(
            Frequency::Daily,
            1,
            Some(5),
            NaiveDate::from_ymd_opt(2026, 12, 31),
        )
        .unwrap_err();
        assert!(matches!(err, DayCountError::CountAndUntil));
    }

    #[test]
    fn until_without_utc_marker_is_rejected() {
        for until in [
            "20261231T000000",
            "20261231",
            "2026-12-31T00:00:00",
            "20261231T000000z",
        ] {
            let err = RecurrenceRule::parse(&format!("FREQ=DAILY;UNTIL={until}")).unwrap_err();
            assert!(
                matches!(err, DayCountError::UntilNotUtc(_)),
                "{until} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn until_is_kept_in_utc() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY;UNTIL=20261231T153000Z").unwrap();
        assert_eq!(
            rule.terminator,
            Terminator::Until(Utc.with_ymd_and_hms(2026, 12, 31, 15, 30, 0).unwrap())
        );
        assert_eq!(rule.to_value(false), "FREQ=WEEKLY;UNTIL=20261231T153000Z");
        assert_eq!(rule.to_value(true), "FREQ=WEEKLY;UNTIL=20261231");
    }

    #[test]
    fn leap_cycle_rule_keeps_its_selectors() {
        let rule = RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=29;INTERVAL=4").unwrap();
        assert_eq!(rule.by_month, vec![2]);
        assert_eq!(rule.by_month_day, vec![29]);
        assert_eq!(rule.interval, 4);
        assert_eq!(
            rule.to_string(),
            "FREQ=YEARLY;INTERVAL=4;BYMONTH=2;BYMONTHDAY=29"
        );
    }

    #[test]
    fn impossible_month_day_is_rejected() {
        let err = RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=30").unwrap_err();
        assert!(err.to_string().contains("never falls"));
        // One selected month that can hold the day is enough
        assert!(RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=2,3;BYMONTHDAY=30").is_ok());
        assert!(RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=-30").is_ok());
        assert!(RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=4;BYMONTHDAY=31").is_err());
    }

    #[test]
    fn last_day_of_month() {
        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=-1").unwrap();
        assert_eq!(rule.by_month_day, vec![-1]);
        assert_eq!(rule.to_string(), "FREQ=MONTHLY;BYMONTHDAY=-1");
    }

    #[test]
    fn last_friday_of_month() {
        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=-1FR;COUNT=6").unwrap();
        assert_eq!(rule.by_day, vec![WeekdayNum::nth(-1, Weekday::Friday)]);
        assert_eq!(rule.to_string(), "FREQ=MONTHLY;COUNT=6;BYDAY=-1FR");

        let thanksgiving = RecurrenceRule::parse("FREQ=YEARLY;BYMONTH=11;BYDAY=+4TH").unwrap();
        assert_eq!(thanksgiving.to_string(), "FREQ=YEARLY;BYMONTH=11;BYDAY=4TH");
    }

    #[test]
    fn weekday_ordinals_need_monthly_or_yearly() {
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=1MO").is_err());
        assert!(RecurrenceRule::parse("FREQ=DAILY;BYDAY=-1FR").is_err());
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=MO,WE,FR").is_ok());
        assert!(RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=0MO").is_err());
        assert!(RecurrenceRule::parse("FREQ=YEARLY;BYDAY=54MO").is_err());
    }

    #[test]
    fn month_day_is_not_allowed_weekly() {
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYMONTHDAY=1").is_err());
    }

    #[test]
    fn last_weekday_of_month_with_setpos() {
        let rule =
            RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;WKST=SU").unwrap();
        assert_eq!(rule.by_set_pos, vec![-1]);
        assert_eq!(rule.week_start, Some(Weekday::Sunday));
        assert_eq!(
            rule.to_string(),
            "FREQ=MONTHLY;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1;WKST=SU"
        );
        assert!(RecurrenceRule::parse("FREQ=MONTHLY;BYSETPOS=-1").is_err());
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let cases = [
            "",
            "RRULE:",
            "COUNT=3",
            "FREQ=HOURLY",
            "FREQ=FORTNIGHTLY",
            "FREQ=DAILY;INTERVAL=0",
            "FREQ=DAILY;INTERVAL=-2",
            "FREQ=DAILY;COUNT=0",
            "FREQ=DAILY;COUNT=ten",
            "FREQ=DAILY;FREQ=WEEKLY",
            "FREQ=DAILY;BYHOUR=9",
            "FREQ=DAILY;COUNT",
            "FREQ=DAILY;BYMONTH=13",
            "FREQ=MONTHLY;BYMONTHDAY=32",
            "FREQ=MONTHLY;BYMONTHDAY=0",
            "FREQ=WEEKLY;BYDAY=XX",
            "FREQ=WEEKLY;BYDAY=",
            "FREQ=WEEKLY;WKST=MONDAY",
        ];
        for case in cases {
            assert!(
                RecurrenceRule::parse(case).is_err(),
                "'{case}' should be rejected"
            );
        }
    }

    #[test]
    fn trailing_semicolon_is_tolerated() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;COUNT=3;").unwrap();
        assert_eq!(rule.terminator, Terminator::Count(3));
    }

    #[test]
    fn preset_builds_until_at_midnight_utc() {
        let rule = RecurrenceRule::preset(
            Frequency::Monthly,
            1,
            None,
            NaiveDate::from_ymd_opt(2026, 6, 30),
        )
        .unwrap();
        assert_eq!(rule.to_string(), "FREQ=MONTHLY;UNTIL=20260630T000000Z");
    }

    #[test]
    fn preset_rejects_zero_interval_and_count() {
        assert!(RecurrenceRule::preset(Frequency::Daily, 0, None, None).is_err());
        assert!(RecurrenceRule::preset(Frequency::Daily, 1, Some(0), None).is_err());
    }
}
