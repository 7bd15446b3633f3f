//! Error types for daycount.

use thiserror::Error;

/// Errors that can occur while computing dates or encoding events.
#[derive(Error, Debug)]
pub enum DayCountError {
    #[error("Invalid date '{input}': expected {expected}")]
    InvalidDate { input: String, expected: String },

    #[error("Invalid time '{0}': expected HH:MM between 00:00 and 23:59")]
    InvalidTime(String),

    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Recurrence rule cannot have both COUNT and UNTIL")]
    CountAndUntil,

    #[error("UNTIL must be a UTC date-time like 20261231T000000Z, got '{0}'")]
    UntilNotUtc(String),

    #[error("At most {max} reminders are allowed, got {got}")]
    TooManyReminders { max: usize, got: usize },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for daycount operations.
pub type DayCountResult<T> = Result<T, DayCountError>;
