//! ICS (RFC 5545) encoding of a single event.

mod generate;
mod write;

pub use generate::{PRODID, generate_ics};
pub use write::{DEFAULT_FILE_STEM, default_filename, ics_path, write_ics};

use crate::error::DayCountResult;
use crate::event::{EventSpec, EventStamp};

/// Encode `spec` with a freshly generated UID and timestamp.
pub fn encode(spec: &EventSpec) -> DayCountResult<String> {
    generate_ics(spec, &EventStamp::fresh())
}
