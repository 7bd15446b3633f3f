//! User configuration at ~/.config/daycount/config.toml
//!
//! Every field has a default, so a missing file is the same as an empty one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::TimeDelta;
use chrono_tz::Tz;
use daycount_core::{DateFormat, parse_timezone};
use serde::{Deserialize, Serialize};

const FALLBACK_TIMEZONE: Tz = chrono_tz::America::New_York;
const DEFAULT_TITLE: &str = "Reminder";
const DEFAULT_DURATION: &str = "60m";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub date_format: DateFormat,

    /// IANA name; the system zone when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    pub title: String,

    /// Minutes before the event.
    pub reminders: Vec<u32>,

    /// Default length of timed events, e.g. "45m" or "1h30m".
    pub duration: String,

    /// Where `--ics` without a path writes; the current directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ics_dir: Option<PathBuf>,

    pub google_calendar_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            date_format: DateFormat::default(),
            timezone: None,
            title: DEFAULT_TITLE.to_string(),
            reminders: Vec::new(),
            duration: DEFAULT_DURATION.to_string(),
            ics_dir: None,
            google_calendar_id: daycount_provider_google::DEFAULT_CALENDAR_ID.to_string(),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("daycount");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn timezone(&self) -> Result<Tz> {
        match &self.timezone {
            Some(name) => Ok(parse_timezone(name)?),
            None => Ok(system_timezone()),
        }
    }

    pub fn duration(&self) -> Result<TimeDelta> {
        parse_duration(&self.duration).context("Invalid duration in config")
    }

    /// Directory for default-named `.ics` files, with `~` expanded.
    pub fn ics_dir(&self) -> PathBuf {
        match &self.ics_dir {
            Some(dir) => expand_path(&dir.to_string_lossy()),
            None => PathBuf::from("."),
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> Result<()> {
        let contents = format!(
            "\
# daycount configuration

# How dates are typed and shown: \"MM/DD/YYYY\", \"DD/MM/YYYY\" or \"YYYY-MM-DD\"
# date_format = \"{}\"

# Time zone for \"today\" and timed events (defaults to the system zone):
# timezone = \"America/New_York\"

# Event title when --title is not given:
# title = \"{}\"

# Reminders in minutes before the event (at most 3):
# reminders = [60, 10]

# Length of timed events:
# duration = \"{}\"

# Where --ics without a path writes:
# ics_dir = \"~/Documents\"

# Google calendar to insert into:
# google_calendar_id = \"{}\"
",
            DateFormat::default(),
            DEFAULT_TITLE,
            DEFAULT_DURATION,
            daycount_provider_google::DEFAULT_CALENDAR_ID,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Could not write config file {}", path.display()))?;

        Ok(())
    }
}

/// Date format and zone in effect for one invocation: flags over config.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub format: DateFormat,
    pub timezone: Tz,
}

impl Settings {
    pub fn resolve(
        config: &Config,
        format: Option<DateFormat>,
        tz: Option<&str>,
    ) -> Result<Self> {
        let timezone = match tz {
            Some(name) => parse_timezone(name)?,
            None => config.timezone()?,
        };

        Ok(Settings {
            format: format.unwrap_or(config.date_format),
            timezone,
        })
    }
}

pub fn system_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse().unwrap_or_else(|_| {
            tracing::debug!(zone = %name, "system zone not in tz database, using fallback");
            FALLBACK_TIMEZONE
        }),
        Err(err) => {
            tracing::debug!("Could not detect system zone: {}", err);
            FALLBACK_TIMEZONE
        }
    }
}

/// Parse a human duration such as "90m" or "1h 30m".
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let std_dur = humantime::parse_duration(input.trim())
        .map_err(|e| anyhow::anyhow!("Could not parse duration \"{}\": {}", input, e))?;
    TimeDelta::from_std(std_dur).context("Duration too large")
}

pub fn expand_path(input: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(input).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.date_format, DateFormat::MonthDayYear);
        assert_eq!(config.title, "Reminder");
        assert_eq!(config.google_calendar_id, "primary");
        assert_eq!(config.duration().unwrap(), TimeDelta::minutes(60));
        assert!(config.reminders.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "date_format = \"YYYY-MM-DD\"\ntimezone = \"Europe/Berlin\"\nreminders = [30]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.date_format, DateFormat::Iso);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.reminders, vec![30]);
        assert_eq!(config.title, "Reminder");
    }

    #[test]
    fn generated_default_file_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daycount").join("config.toml");

        Config::create_default_config(&path).unwrap();
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.title, "Reminder");
        assert_eq!(config.duration, "60m");
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            timezone: Some("Europe/Berlin".to_string()),
            ..Config::default()
        };

        let settings =
            Settings::resolve(&config, Some(DateFormat::Iso), Some("Asia/Tokyo")).unwrap();
        assert_eq!(settings.format, DateFormat::Iso);
        assert_eq!(settings.timezone, chrono_tz::Asia::Tokyo);

        let settings = Settings::resolve(&config, None, None).unwrap();
        assert_eq!(settings.format, DateFormat::MonthDayYear);
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);

        assert!(Settings::resolve(&config, None, Some("Nowhere/Land")).is_err());
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("90m").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration("1h 30m").unwrap(), TimeDelta::minutes(90));
        assert!(parse_duration("soon").is_err());
    }
}
