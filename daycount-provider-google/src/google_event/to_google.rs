use anyhow::Result;
use daycount_core::{EventSpec, EventTiming};
use google_calendar::types::{Event, EventDateTime, EventReminder, Reminders};

pub trait ToGoogle {
    fn to_google(&self) -> Result<Event>;
}

impl ToGoogle for EventSpec {
    /// Validates first, so an invalid spec never becomes a payload.
    fn to_google(&self) -> Result<Event> {
        self.validate()?;

        let (start, end) = match self.timing {
            EventTiming::AllDay { date } => (
                all_day_to_google(date),
                all_day_to_google(EventSpec::all_day_end(date)?),
            ),
            EventTiming::Timed { .. } => {
                let (start, end) = self
                    .utc_span()?
                    .ok_or_else(|| anyhow::anyhow!("timed event without a start time"))?;
                let tz = self.timezone.name();
                (timed_to_google(start, tz), timed_to_google(end, tz))
            }
        };

        // Always send an explicit reminder list so the calendar's own defaults
        // don't get added on top.
        let reminders = Reminders {
            overrides: self
                .reminders
                .iter()
                .map(|r| EventReminder {
                    method: "popup".to_string(),
                    minutes: i64::from(r.minutes),
                })
                .collect(),
            use_default: false,
        };

        let recurrence = self
            .recurrence
            .as_ref()
            .map(|rule| vec![format!("RRULE:{}", rule.to_value(self.is_all_day()))])
            .unwrap_or_default();

        Ok(Event {
            summary: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            start: Some(start),
            end: Some(end),
            reminders: Some(reminders),
            recurrence,
            ..Default::default()
        })
    }
}

fn all_day_to_google(date: chrono::NaiveDate) -> EventDateTime {
    EventDateTime {
        date: Some(date),
        date_time: None,
        time_zone: String::new(),
    }
}

fn timed_to_google(instant: chrono::DateTime<chrono::Utc>, tz: &str) -> EventDateTime {
    EventDateTime {
        date: None,
        date_time: Some(instant),
        time_zone: tz.to_string(),
    }
}
