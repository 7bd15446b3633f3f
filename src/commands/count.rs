//! The three counting commands: compute, print, then emit the event if asked.

use anyhow::Result;
use daycount_core::Computation;

use crate::commands::emit::emit;
use crate::commands::event_args::EventArgs;
use crate::config::{Config, Settings};
use crate::render::{Render, Summary};

pub async fn run(
    computation: Computation,
    event: &EventArgs,
    settings: &Settings,
    config: &Config,
) -> Result<()> {
    let outcome = computation.evaluate()?;
    tracing::debug!(?computation, target = %outcome.target, "computed");

    println!(
        "{}",
        Summary {
            outcome: &outcome,
            format: settings.format,
        }
        .render()
    );

    if !event.wants_event() {
        return Ok(());
    }

    // An invalid event is reported before any sink runs
    let spec = event.to_spec(outcome.target, settings, config)?;

    println!();
    let outcomes = emit(&spec, event, config).await;
    for sink in &outcomes {
        println!("{}", sink.render());
    }

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} outputs failed", failed, outcomes.len());
    }

    Ok(())
}
