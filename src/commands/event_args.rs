//! Event options shared by the counting commands.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use daycount_core::{EventSpec, Frequency, RecurrenceRule, Reminder, parse_time_of_day};

use crate::config::{Config, Settings, parse_duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Repeat {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<Repeat> for Frequency {
    fn from(repeat: Repeat) -> Self {
        match repeat {
            Repeat::Daily => Frequency::Daily,
            Repeat::Weekly => Frequency::Weekly,
            Repeat::Monthly => Frequency::Monthly,
            Repeat::Yearly => Frequency::Yearly,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// Event title (defaults to the configured title)
    #[arg(long)]
    pub title: Option<String>,

    /// Write an .ics file; without a path, a title-based name in the configured directory
    #[arg(long, value_name = "PATH")]
    #[arg(num_args = 0..=1, default_missing_value = "")]
    pub ics: Option<String>,

    /// Insert the event into Google Calendar
    #[arg(long)]
    pub google: bool,

    /// Google calendar to insert into
    #[arg(long, requires = "google")]
    pub calendar_id: Option<String>,

    /// Start time (HH:MM) for a timed event; all-day otherwise
    #[arg(long, value_name = "HH:MM")]
    pub at: Option<String>,

    /// Length of a timed event (e.g. "30m", "1h30m")
    #[arg(long, requires = "at")]
    pub duration: Option<String>,

    /// Reminders in minutes before the event, comma separated (at most 3)
    #[arg(long, value_name = "MINUTES", value_delimiter = ',')]
    pub remind: Vec<u32>,

    /// Repeat the event
    #[arg(long, value_enum)]
    pub repeat: Option<Repeat>,

    /// Repeat every N periods
    #[arg(long, requires = "repeat")]
    pub interval: Option<u32>,

    /// Stop after N occurrences
    #[arg(long, requires = "repeat")]
    pub count: Option<u32>,

    /// Repeat until this date; occurrences must start before 00:00 UTC on it
    #[arg(long, requires = "repeat")]
    pub until: Option<String>,

    /// Custom recurrence rule, e.g. "FREQ=MONTHLY;BYDAY=-1FR"
    #[arg(long, conflicts_with = "repeat")]
    pub rrule: Option<String>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,
}

impl EventArgs {
    /// Whether any sink was requested.
    pub fn wants_event(&self) -> bool {
        self.ics.is_some() || self.google
    }

    /// Build the event landing on `date`.
    pub fn to_spec(
        &self,
        date: NaiveDate,
        settings: &Settings,
        config: &Config,
    ) -> Result<EventSpec> {
        let title = self
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| config.title.clone());

        let spec = match &self.at {
            Some(at) => {
                let time = parse_time_of_day(at)?;
                let duration = match &self.duration {
                    Some(d) => parse_duration(d)?,
                    None => config.duration()?,
                };
                EventSpec::timed(title, date.and_time(time), duration, settings.timezone)
            }
            None => EventSpec::all_day(title, date, settings.timezone),
        };

        let minutes = if self.remind.is_empty() {
            &config.reminders
        } else {
            &self.remind
        };
        let reminders = minutes
            .iter()
            .copied()
            .map(Reminder::minutes_before)
            .collect();

        let spec = spec
            .with_reminders(reminders)
            .with_recurrence(self.recurrence(settings)?)
            .with_description(self.description.clone().filter(|d| !d.trim().is_empty()));

        spec.validate()?;
        Ok(spec)
    }

    fn recurrence(&self, settings: &Settings) -> Result<Option<RecurrenceRule>> {
        if let Some(rule) = &self.rrule {
            return Ok(Some(RecurrenceRule::parse(rule)?));
        }

        let Some(repeat) = self.repeat else {
            return Ok(None);
        };

        let until = match &self.until {
            Some(s) => Some(settings.format.parse(s)?),
            None => None,
        };

        Ok(Some(RecurrenceRule::preset(
            repeat.into(),
            self.interval.unwrap_or(1),
            self.count,
            until,
        )?))
    }
}
