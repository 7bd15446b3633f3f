//! Prompt-driven form covering the same fields as the flags.

use anyhow::Result;
use chrono::NaiveDate;
use daycount_core::{Computation, RecurrenceRule, parse_time_of_day, today_in};
use dialoguer::{Confirm, Input, Select};
use owo_colors::OwoColorize;

use crate::commands::count;
use crate::commands::event_args::{EventArgs, Repeat};
use crate::config::{Config, Settings, parse_duration};

const MODES: &[&str] = &[
    "Days until a date",
    "Date N days after a start",
    "Start date N days before an end",
];

const REPEATS: &[&str] = &[
    "Never",
    "Daily",
    "Weekly",
    "Monthly",
    "Yearly",
    "Custom rule",
];

pub async fn run(settings: &Settings, config: &Config) -> Result<()> {
    let today = today_in(settings.timezone);
    let format = settings.format;
    let date_prompt = |label: &str| format!("  {} ({})", label, format.label());

    let mode = Select::new()
        .with_prompt("  What do you want to count?")
        .items(MODES)
        .default(0)
        .interact()?;

    let computation = match mode {
        0 => Computation::DaysUntil {
            start: prompt_date(&date_prompt("Start date"), settings, Some(today))?,
            end: prompt_date(&date_prompt("End date"), settings, None)?,
        },
        1 => Computation::AddDays {
            start: prompt_date(&date_prompt("Start date"), settings, Some(today))?,
            days: Input::<i64>::new()
                .with_prompt("  Days to add")
                .interact_text()?,
        },
        _ => Computation::SubtractDays {
            end: prompt_date(&date_prompt("End date"), settings, None)?,
            days: Input::<i64>::new()
                .with_prompt("  Days to subtract")
                .interact_text()?,
        },
    };

    // Fail on an impossible date before asking anything else
    computation.evaluate()?;

    let wants_event = Confirm::new()
        .with_prompt("  Create a calendar event for the result?")
        .default(false)
        .interact()?;

    let event = if wants_event {
        prompt_event(settings, config)?
    } else {
        EventArgs::default()
    };

    println!();
    count::run(computation, &event, settings, config).await
}

fn prompt_event(settings: &Settings, config: &Config) -> Result<EventArgs> {
    let title: String = Input::new()
        .with_prompt("  Title")
        .default(config.title.clone())
        .interact_text()?;

    let all_day = Confirm::new()
        .with_prompt("  All-day event?")
        .default(true)
        .interact()?;

    let (at, duration) = if all_day {
        (None, None)
    } else {
        let at = prompt_with_retry("  Start time (HH:MM)", None, |s| {
            parse_time_of_day(s)?;
            Ok(())
        })?;
        let duration = prompt_with_retry("  How long?", Some(config.duration.clone()), |s| {
            parse_duration(s).map(|_| ())
        })?;
        (Some(at), Some(duration))
    };

    let remind = prompt_with_retry(
        "  Reminders, minutes before (e.g. 60,10; skip)",
        Some(String::new()),
        |s| parse_reminders(s).map(|_| ()),
    )?;
    let remind = parse_reminders(&remind)?;

    let mut event = EventArgs {
        title: Some(title),
        at,
        duration,
        remind,
        ..Default::default()
    };

    prompt_recurrence(&mut event, settings)?;

    let description: String = Input::new()
        .with_prompt("  Description (skip)")
        .default(String::new())
        .show_default(false)
        .interact_text()?;
    event.description = Some(description).filter(|d| !d.is_empty());

    if Confirm::new()
        .with_prompt("  Save an .ics file?")
        .default(true)
        .interact()?
    {
        let path: String = Input::new()
            .with_prompt("  File path (default name)")
            .default(String::new())
            .show_default(false)
            .interact_text()?;
        event.ics = Some(path);
    }

    event.google = Confirm::new()
        .with_prompt("  Add to Google Calendar?")
        .default(false)
        .interact()?;

    Ok(event)
}

fn prompt_recurrence(event: &mut EventArgs, settings: &Settings) -> Result<()> {
    let choice = Select::new()
        .with_prompt("  Repeat")
        .items(REPEATS)
        .default(0)
        .interact()?;

    let repeat = match choice {
        0 => return Ok(()),
        1 => Repeat::Daily,
        2 => Repeat::Weekly,
        3 => Repeat::Monthly,
        4 => Repeat::Yearly,
        _ => {
            let rule = prompt_with_retry("  Rule (e.g. FREQ=MONTHLY;BYDAY=-1FR)", None, |s| {
                RecurrenceRule::parse(s)?;
                Ok(())
            })?;
            event.rrule = Some(rule);
            return Ok(());
        }
    };

    event.repeat = Some(repeat);
    event.interval = Some(
        Input::<u32>::new()
            .with_prompt("  Every how many periods?")
            .default(1)
            .interact_text()?,
    );

    let ends = Select::new()
        .with_prompt("  Ends")
        .items(&["Never", "After a number of times", "On a date"])
        .default(0)
        .interact()?;

    match ends {
        1 => {
            event.count = Some(
                Input::<u32>::new()
                    .with_prompt("  Number of times")
                    .interact_text()?,
            )
        }
        2 => {
            let label = format!("  Last date ({})", settings.format.label());
            event.until = Some(prompt_with_retry(&label, None, |s| {
                settings.format.parse(s)?;
                Ok(())
            })?);
        }
        _ => {}
    }

    Ok(())
}

fn prompt_date(
    prompt: &str,
    settings: &Settings,
    default: Option<NaiveDate>,
) -> Result<NaiveDate> {
    let default = default.map(|d| settings.format.format(d));
    let input = prompt_with_retry(prompt, default, |s| {
        settings.format.parse(s)?;
        Ok(())
    })?;
    Ok(settings.format.parse(&input)?)
}

/// Prompt the user with retry on validation errors.
fn prompt_with_retry<F>(prompt: &str, default: Option<String>, check: F) -> Result<String>
where
    F: Fn(&str) -> Result<()>,
{
    loop {
        let mut input = Input::<String>::new().with_prompt(prompt);
        if let Some(default) = &default {
            input = input
                .default(default.clone())
                .show_default(!default.is_empty());
        }
        let value = input.interact_text()?;
        match check(&value) {
            Ok(()) => return Ok(value),
            Err(e) => {
                eprintln!("  {}", e.to_string().red());
            }
        }
    }
}

/// Comma separated minutes; empty means none.
fn parse_reminders(input: &str) -> Result<Vec<u32>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| anyhow::anyhow!("\"{}\" is not a number of minutes", s))
        })
        .collect()
}
