use anyhow::Result;
use daycount_provider_google::SessionStore;
use daycount_provider_google::app_config;
use owo_colors::OwoColorize;

use crate::config::{Config, Settings};

pub fn run(init: bool, config: &Config, settings: &Settings) -> Result<()> {
    let config_path = Config::config_path()?;

    if init {
        if config_path.exists() {
            println!("Config already exists at {}", config_path.display());
        } else {
            Config::create_default_config(&config_path)?;
            println!("{}", format!("Created {}", config_path.display()).green());
        }
        return Ok(());
    }

    println!("{}", "Paths".bold());
    println!("  Config:       {}", config_path.display());
    println!(
        "  Google app:   {}",
        app_config::base_dir()?.join("app_config.toml").display()
    );
    println!(
        "  Google auth:  {}",
        SessionStore::default_location()?.path().display()
    );

    println!();
    println!("{}", "Effective settings".bold());
    println!("  Date format:  {}", settings.format);
    println!("  Time zone:    {}", settings.timezone.name());
    println!("  Title:        {}", config.title);
    println!("  Duration:     {}", config.duration);
    println!(
        "  Reminders:    {}",
        if config.reminders.is_empty() {
            "none".to_string()
        } else {
            config
                .reminders
                .iter()
                .map(|m| format!("{m}m"))
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!("  .ics folder:  {}", config.ics_dir().display());
    println!("  Calendar id:  {}", config.google_calendar_id);

    Ok(())
}
