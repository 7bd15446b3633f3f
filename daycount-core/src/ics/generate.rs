//! ICS document generation.

use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::error::{DayCountError, DayCountResult};
use crate::event::{EventSpec, EventStamp, EventTiming, Reminder};

pub const PRODID: &str = "-//daycount//EN";

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

/// Generate a complete VCALENDAR document holding one VEVENT.
///
/// Lines are CRLF-terminated, including the last one.
pub fn generate_ics(spec: &EventSpec, stamp: &EventStamp) -> DayCountResult<String> {
    spec.validate()?;

    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&stamp.uid);
    ics_event.summary(&spec.title);
    ics_event.add_property("DTSTAMP", stamp.created.format(UTC_FORMAT).to_string());

    match spec.timing {
        EventTiming::AllDay { date } => {
            add_date_property(&mut ics_event, "DTSTART", date);
            add_date_property(&mut ics_event, "DTEND", EventSpec::all_day_end(date)?);
        }
        EventTiming::Timed { .. } => {
            let (start, end) = spec.utc_span()?.ok_or_else(|| {
                DayCountError::IcsGenerate("timed event without a start time".into())
            })?;
            ics_event.add_property("DTSTART", start.format(UTC_FORMAT).to_string());
            ics_event.add_property("DTEND", end.format(UTC_FORMAT).to_string());
        }
    }

    // Timed events are written in UTC, so keep the zone the user meant
    match (&spec.description, spec.is_all_day()) {
        (Some(desc), _) => {
            ics_event.description(desc);
        }
        (None, false) => {
            ics_event.description(&format!("Time zone: {}", spec.timezone.name()));
        }
        (None, true) => {}
    }

    if let Some(ref rule) = spec.recurrence {
        ics_event.add_property("RRULE", rule.to_value(spec.is_all_day()));
    }

    for reminder in &spec.reminders {
        ics_event.alarm(reminder_alarm(reminder));
    }

    let ics_event = ics_event.done();
    cal.push(ics_event);
    let cal = cal.done();

    Ok(normalize_output(&cal.to_string()))
}

/// A minimal DISPLAY alarm firing `minutes` before DTSTART.
fn reminder_alarm(reminder: &Reminder) -> Alarm {
    let lead = chrono::Duration::minutes(i64::from(reminder.minutes));
    let mut alarm = Alarm::display("Reminder", Trigger::before_start(lead));
    alarm.add_property("TRIGGER", format!("-PT{}M", reminder.minutes));
    alarm
}

fn add_date_property(ics_event: &mut icalendar::Event, name: &str, date: chrono::NaiveDate) {
    let mut prop = Property::new(name, date.format(DATE_FORMAT).to_string());
    prop.append_parameter(ValueType::Date);
    ics_event.append_property(prop);
}

/// Clean up the icalendar crate's output:
/// - use our own PRODID
/// - drop DTSTAMP and UID inside VALARM (not part of RFC 5545 alarms)
/// - terminate every line with CRLF
fn normalize_output(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "BEGIN:VALARM" {
            in_valarm = true;
        } else if line == "END:VALARM" {
            in_valarm = false;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
