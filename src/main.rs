mod commands;
mod config;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use daycount_core::{Computation, DateFormat, today_in};
use tracing_subscriber::EnvFilter;

use crate::commands::event_args::EventArgs;
use crate::config::{Config, Settings};

#[derive(Parser)]
#[command(name = "daycount", version)]
#[command(about = "Count days between dates and turn the result into a calendar event")]
struct Cli {
    /// Date format: MM/DD/YYYY, DD/MM/YYYY or YYYY-MM-DD
    #[arg(long, global = true)]
    format: Option<DateFormat>,

    /// IANA time zone for "today" and timed events (e.g. Europe/Berlin)
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count the days from a start date (today by default) until END
    Until {
        end: String,

        /// Start date (defaults to today)
        #[arg(long)]
        from: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    /// Find the date DAYS after a start date (today by default)
    Add {
        #[arg(allow_negative_numbers = true)]
        days: i64,

        /// Start date (defaults to today)
        #[arg(long)]
        from: Option<String>,

        #[command(flatten)]
        event: EventArgs,
    },
    /// Find the start date DAYS before END
    Before {
        end: String,

        #[arg(allow_negative_numbers = true)]
        days: i64,

        #[command(flatten)]
        event: EventArgs,
    },
    /// Sign in to Google Calendar (or out, with --logout)
    Auth {
        #[arg(long)]
        logout: bool,
    },
    /// Answer prompts instead of passing flags
    Interactive,
    /// Show configuration paths and effective settings
    Config {
        /// Write a commented default config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = Config::load()?;
    let settings = Settings::resolve(&config, cli.format, cli.tz.as_deref())?;
    let format = settings.format;

    match cli.command {
        Commands::Until { end, from, event } => {
            let start = start_date(from.as_deref(), &settings)?;
            let end = format.parse(&end)?;
            let computation = Computation::DaysUntil { start, end };
            commands::count::run(computation, &event, &settings, &config).await
        }
        Commands::Add { days, from, event } => {
            let start = start_date(from.as_deref(), &settings)?;
            let computation = Computation::AddDays { start, days };
            commands::count::run(computation, &event, &settings, &config).await
        }
        Commands::Before { end, days, event } => {
            let end = format.parse(&end)?;
            let computation = Computation::SubtractDays { end, days };
            commands::count::run(computation, &event, &settings, &config).await
        }
        Commands::Auth { logout } => commands::auth::run(logout).await,
        Commands::Interactive => commands::interactive::run(&settings, &config).await,
        Commands::Config { init } => commands::config::run(init, &config, &settings),
    }
}

/// Logs go to stderr; RUST_LOG wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn start_date(from: Option<&str>, settings: &Settings) -> Result<chrono::NaiveDate> {
    match from {
        Some(s) => Ok(settings.format.parse(s)?),
        None => Ok(today_in(settings.timezone)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_accepts_negative_days() {
        let cli = Cli::try_parse_from(["daycount", "add", "-7", "--from", "09/02/2025"]).unwrap();
        let Commands::Add { days, from, .. } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(days, -7);
        assert_eq!(from.as_deref(), Some("09/02/2025"));
    }

    #[test]
    fn event_flags_parse() {
        let cli = Cli::try_parse_from([
            "daycount",
            "--format",
            "iso",
            "until",
            "2026-01-01",
            "--title",
            "New Year",
            "--ics",
            "--remind",
            "60,10",
            "--repeat",
            "yearly",
            "--count",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(DateFormat::Iso));
        let Commands::Until { event, .. } = cli.command else {
            panic!("expected until");
        };
        assert_eq!(event.ics.as_deref(), Some(""));
        assert_eq!(event.remind, vec![60, 10]);
        assert_eq!(event.count, Some(3));
    }

    #[test]
    fn until_help_names_the_utc_cutoff() {
        let cmd = Cli::command();
        let until = cmd
            .find_subcommand("add")
            .and_then(|sub| sub.get_arguments().find(|arg| arg.get_id() == "until"))
            .unwrap();
        assert!(until.get_help().unwrap().to_string().contains("00:00 UTC"));
    }

    #[test]
    fn rrule_conflicts_with_repeat() {
        let result = Cli::try_parse_from([
            "daycount",
            "until",
            "01/01/2026",
            "--repeat",
            "daily",
            "--rrule",
            "FREQ=DAILY",
        ]);
        assert!(result.is_err());
    }
}
