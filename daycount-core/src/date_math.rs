//! Day-span arithmetic and the three counting modes.

use chrono::{NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::date_format::DateFormat;
use crate::error::{DayCountError, DayCountResult};

/// Add `days` (possibly negative) to `date`.
pub fn add_days(date: NaiveDate, days: i64) -> DayCountResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| DayCountError::DateOutOfRange(format!("{date} + {days} days")))
}

/// Subtract `days` (possibly negative) from `date`.
pub fn subtract_days(date: NaiveDate, days: i64) -> DayCountResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .ok_or_else(|| DayCountError::DateOutOfRange(format!("{date} - {days} days")))
}

/// Signed number of days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

/// Today's calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// One of the three ways a user can ask for a date offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Computation {
    /// How many days from `start` until `end`.
    DaysUntil { start: NaiveDate, end: NaiveDate },
    /// Which date lies `days` after `start`.
    AddDays { start: NaiveDate, days: i64 },
    /// Which date lies `days` before `end`.
    SubtractDays { end: NaiveDate, days: i64 },
}

/// Result of evaluating a [`Computation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub computation: Computation,
    /// Day span involved (computed for `DaysUntil`, echoed otherwise).
    pub days: i64,
    /// The date an emitted event lands on.
    pub target: NaiveDate,
}

impl Computation {
    pub fn evaluate(self) -> DayCountResult<Outcome> {
        let (days, target) = match self {
            Computation::DaysUntil { start, end } => (days_between(start, end), end),
            Computation::AddDays { start, days } => (days, add_days(start, days)?),
            Computation::SubtractDays { end, days } => (days, subtract_days(end, days)?),
        };

        Ok(Outcome {
            computation: self,
            days,
            target,
        })
    }
}

impl Outcome {
    /// Multi-line summary for display, with dates in `format`.
    pub fn describe(&self, format: DateFormat) -> String {
        let abs = self.days.abs();
        match self.computation {
            Computation::DaysUntil { start, end } => {
                let direction = if self.days >= 0 { "ahead" } else { "ago" };
                format!(
                    "Start: {}\nEnd:   {}\nResult: {} day(s) ({} {} of start).",
                    format.format(start),
                    format.format(end),
                    self.days,
                    abs,
                    direction
                )
            }
            Computation::AddDays { start, days } => {
                let direction = if days >= 0 { "from" } else { "before" };
                format!(
                    "Start: {}\nDays:  {}\nResult: {} ({} day(s) {} start).",
                    format.format(start),
                    days,
                    format.format(self.target),
                    abs,
                    direction
                )
            }
            Computation::SubtractDays { end, days } => format!(
                "End:   {}\nDays to subtract: {}\nResult (start date): {}.",
                format.format(end),
                days,
                format.format(self.target)
            ),
        }
    }
}
