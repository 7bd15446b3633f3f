//! The single event a computation can be turned into.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::error::{DayCountError, DayCountResult};
use crate::recurrence::RecurrenceRule;

/// Calendar applications only surface a handful of alarms per event.
pub const MAX_REMINDERS: usize = 3;

/// Used when a timed event is created without an explicit duration.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

const UID_DOMAIN: &str = "daycount";

/// A reminder fired some minutes before the event starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reminder {
    pub minutes: u32,
}

impl Reminder {
    pub const fn minutes_before(minutes: u32) -> Self {
        Reminder { minutes }
    }
}

/// When the event happens.
///
/// All-day events have no time of day and are never shifted between zones.
/// Timed events hold local wall time, interpreted in the event timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    AllDay { date: NaiveDate },
    Timed { start: NaiveDateTime, duration: TimeDelta },
}

/// Everything needed to emit one (possibly repeating) event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    pub title: String,
    pub timing: EventTiming,
    pub timezone: Tz,
    pub reminders: Vec<Reminder>,
    pub recurrence: Option<RecurrenceRule>,
    pub description: Option<String>,
}

impl EventSpec {
    pub fn all_day(title: impl Into<String>, date: NaiveDate, timezone: Tz) -> Self {
        EventSpec {
            title: title.into(),
            timing: EventTiming::AllDay { date },
            timezone,
            reminders: Vec::new(),
            recurrence: None,
            description: None,
        }
    }

    pub fn timed(
        title: impl Into<String>,
        start: NaiveDateTime,
        duration: TimeDelta,
        timezone: Tz,
    ) -> Self {
        EventSpec {
            title: title.into(),
            timing: EventTiming::Timed { start, duration },
            timezone,
            reminders: Vec::new(),
            recurrence: None,
            description: None,
        }
    }

    pub fn with_reminders(mut self, reminders: Vec<Reminder>) -> Self {
        self.reminders = reminders;
        self
    }

    pub fn with_recurrence(mut self, rule: Option<RecurrenceRule>) -> Self {
        self.recurrence = rule;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self.timing, EventTiming::AllDay { .. })
    }

    /// Check every field before anything is emitted.
    pub fn validate(&self) -> DayCountResult<()> {
        if self.title.trim().is_empty() {
            return Err(DayCountError::InvalidEvent("title cannot be empty".into()));
        }

        if self.reminders.len() > MAX_REMINDERS {
            return Err(DayCountError::TooManyReminders {
                max: MAX_REMINDERS,
                got: self.reminders.len(),
            });
        }

        if let EventTiming::Timed { duration, .. } = self.timing {
            if duration <= TimeDelta::zero() {
                return Err(DayCountError::InvalidEvent(
                    "duration must be greater than zero".into(),
                ));
            }
            self.utc_span()?;
        }

        if let Some(rule) = &self.recurrence {
            rule.validate()?;
        }

        Ok(())
    }

    /// Last day of an all-day event, exclusive (the day after it).
    pub fn all_day_end(date: NaiveDate) -> DayCountResult<NaiveDate> {
        date.succ_opt()
            .ok_or_else(|| DayCountError::DateOutOfRange(format!("day after {date}")))
    }

    /// Start and end of a timed event as UTC instants; `None` for all-day events.
    ///
    /// A wall time skipped by a DST change is an error; a repeated wall time
    /// resolves to its earlier instant.
    pub fn utc_span(&self) -> DayCountResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let EventTiming::Timed { start, duration } = self.timing else {
            return Ok(None);
        };

        let local = self
            .timezone
            .from_local_datetime(&start)
            .earliest()
            .ok_or_else(|| {
                DayCountError::InvalidEvent(format!(
                    "{} does not exist in {} (skipped by a clock change)",
                    start.format("%Y-%m-%d %H:%M"),
                    self.timezone.name()
                ))
            })?;

        let start_utc = local.with_timezone(&Utc);
        let end_utc = start_utc
            .checked_add_signed(duration)
            .ok_or_else(|| DayCountError::DateOutOfRange(format!("{start} + {duration}")))?;

        Ok(Some((start_utc, end_utc)))
    }
}

/// Identity of one emitted event: its UID and DTSTAMP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStamp {
    pub uid: String,
    pub created: DateTime<Utc>,
}

impl EventStamp {
    /// A new globally unique UID stamped with the current time.
    pub fn fresh() -> Self {
        EventStamp {
            uid: format!("{}@{}", Uuid::new_v4(), UID_DOMAIN),
            created: Utc::now(),
        }
    }
}
