use std::process::ExitCode;

use anyhow::{Context, Result};
use common::config::Configuration;

/// Display the effective configuration in human-readable or JSON form.
pub fn run(config: &Configuration, json: bool) -> Result<ExitCode> {
    if json {
        let rendered = serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration to JSON")?;
        println!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("logsweep configuration:");
    println!(
        "  storage.dsn:        {}",
        config.storage.dsn.as_deref().unwrap_or("(unset)")
    );
    println!(
        "  sweep.max_age:      {}",
        humantime::format_duration(config.sweep.max_age)
    );
    println!(
        "  sweep.grace_period: {}",
        humantime::format_duration(config.sweep.grace_period)
    );
    println!(
        "  sweep.prefix:       {}",
        config.sweep.prefix.as_deref().unwrap_or("(unset)")
    );
    println!(
        "  sweep.pattern:      {}",
        config.sweep.pattern.as_deref().unwrap_or("(unset)")
    );
    match config.sweep.min_size {
        Some(bytes) => println!("  sweep.min_size:     {bytes} bytes"),
        None => println!("  sweep.min_size:     (unset)"),
    }
    println!("  sweep.dry_run:      {}", config.sweep.dry_run);
    println!("  sweep.concurrency:  {}", config.sweep.concurrency);
    println!(
        "  sweep.archive_to:   {}",
        config.sweep.archive_to.as_deref().unwrap_or("(unset)")
    );

    Ok(ExitCode::SUCCESS)
}
