//! Core library for daycount.
//!
//! - `date_format` / `date_math`: parsing dates and counting days between them
//! - `recurrence`: RFC 5545 RRULE values, validated before use
//! - `event` / `ics`: turning a computed date into a calendar event document

pub mod date_format;
pub mod date_math;
pub mod error;
pub mod event;
pub mod ics;
pub mod recurrence;

pub use date_format::{DateFormat, parse_time_of_day, parse_timezone};
pub use date_math::{Computation, Outcome, add_days, days_between, subtract_days, today_in};
pub use error::{DayCountError, DayCountResult};
pub use event::{EventSpec, EventStamp, EventTiming, MAX_REMINDERS, Reminder};
pub use recurrence::{Frequency, RecurrenceRule, Terminator, Weekday, WeekdayNum};
