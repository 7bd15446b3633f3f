//! Send one event to every requested sink.
//!
//! The `.ics` file and the Google insert are independent: each reports its
//! own outcome and a failure in one never stops the other.

use std::path::PathBuf;

use anyhow::{Context, Result};
use daycount_core::EventSpec;
use daycount_core::ics::{default_filename, encode, write_ics};
use daycount_provider_google::{
    AuthContext, GoogleAuthorizer, InsertedEvent, SessionStore, insert_event,
};

use crate::commands::event_args::EventArgs;
use crate::config::{Config, expand_path};
use crate::utils::tui::create_spinner;

#[derive(Debug)]
pub enum SinkOutcome {
    Written(PathBuf),
    Inserted(InsertedEvent),
    Failed {
        sink: &'static str,
        error: anyhow::Error,
    },
}

impl SinkOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SinkOutcome::Failed { .. })
    }
}

pub async fn emit(spec: &EventSpec, args: &EventArgs, config: &Config) -> Vec<SinkOutcome> {
    let mut outcomes = Vec::new();

    if let Some(path) = &args.ics {
        let target = ics_target(path, &spec.title, config);
        outcomes.push(match write_file(spec, target) {
            Ok(written) => SinkOutcome::Written(written),
            Err(error) => SinkOutcome::Failed {
                sink: ".ics file",
                error,
            },
        });
    }

    if args.google {
        let calendar_id = args
            .calendar_id
            .as_deref()
            .unwrap_or(&config.google_calendar_id);
        outcomes.push(match insert_google(spec, calendar_id).await {
            Ok(inserted) => SinkOutcome::Inserted(inserted),
            Err(error) => SinkOutcome::Failed {
                sink: "Google Calendar",
                error,
            },
        });
    }

    outcomes
}

/// Where `--ics` writes: the given path, or a title-based name in `ics_dir`.
fn ics_target(path: &str, title: &str, config: &Config) -> PathBuf {
    if path.trim().is_empty() {
        config.ics_dir().join(default_filename(title))
    } else {
        expand_path(path.trim())
    }
}

fn write_file(spec: &EventSpec, target: PathBuf) -> Result<PathBuf> {
    let document = encode(spec)?;
    let written = write_ics(&target, &document)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    tracing::info!(path = %written.display(), "ics file written");
    Ok(written)
}

async fn insert_google(spec: &EventSpec, calendar_id: &str) -> Result<InsertedEvent> {
    let authorizer = GoogleAuthorizer::from_app_config()?;
    let mut auth = AuthContext::new(SessionStore::default_location()?, authorizer);

    // Authorize before the spinner so the consent prompt stays readable
    auth.acquire().await?;

    let spinner = create_spinner("Adding event to Google Calendar".to_string());
    let result = insert_event(&mut auth, spec, calendar_id).await;
    spinner.finish_and_clear();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn spec() -> EventSpec {
        EventSpec::all_day(
            "Happy New Year",
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            chrono_tz::UTC,
        )
    }

    #[test]
    fn empty_ics_path_uses_configured_directory() {
        let config = Config {
            ics_dir: Some(PathBuf::from("/tmp/cal")),
            ..Config::default()
        };
        assert_eq!(
            ics_target("", "Happy New Year", &config),
            PathBuf::from("/tmp/cal/happy-new-year.ics")
        );
        assert_eq!(
            ics_target("/tmp/x/event", "Happy New Year", &config),
            PathBuf::from("/tmp/x/event")
        );
    }

    #[tokio::test]
    async fn ics_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let args = EventArgs {
            ics: Some(dir.path().join("ny").display().to_string()),
            ..Default::default()
        };

        let outcomes = emit(&spec(), &args, &Config::default()).await;

        assert_eq!(outcomes.len(), 1);
        let SinkOutcome::Written(path) = &outcomes[0] else {
            panic!("expected a written file, got {:?}", outcomes[0]);
        };
        assert_eq!(path, &dir.path().join("ny.ics"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("SUMMARY:Happy New Year"));
    }

    #[tokio::test]
    async fn failed_file_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let args = EventArgs {
            ics: Some(dir.path().join("missing/ny").display().to_string()),
            ..Default::default()
        };

        let outcomes = emit(&spec(), &args, &Config::default()).await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_failure());
    }

    #[tokio::test]
    async fn no_sinks_no_outcomes() {
        let outcomes = emit(&spec(), &EventArgs::default(), &Config::default()).await;
        assert!(outcomes.is_empty());
    }
}
