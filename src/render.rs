//! Colored terminal rendering for computation results and sink outcomes.

use daycount_core::{DateFormat, Outcome};
use owo_colors::OwoColorize;

use crate::commands::emit::SinkOutcome;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// An outcome paired with the format its dates are shown in.
pub struct Summary<'a> {
    pub outcome: &'a Outcome,
    pub format: DateFormat,
}

impl Render for Summary<'_> {
    fn render(&self) -> String {
        self.outcome
            .describe(self.format)
            .lines()
            .map(|line| {
                if line.starts_with("Result") {
                    line.bold().to_string()
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for SinkOutcome {
    fn render(&self) -> String {
        match self {
            SinkOutcome::Written(path) => format!("{} Saved {}", "✓".green(), path.display()),
            SinkOutcome::Inserted(event) => {
                let link = if event.html_link.is_empty() {
                    "(no link returned)".to_string()
                } else {
                    event.html_link.clone()
                };
                format!(
                    "{} Added to Google Calendar: {}",
                    "✓".green(),
                    link.dimmed()
                )
            }
            SinkOutcome::Failed { sink, error } => {
                format!("{} {} failed: {:#}", "✗".red(), sink, error)
            }
        }
    }
}
