use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use common::config::Configuration;
use sweeper::{Archiver, SweepEngine, SweepOptions, SweepResult};

use super::{PolicyArgs, TargetArgs};

/// Delete expired objects, optionally archiving them first.
#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Delete worker pool width
    #[arg(long)]
    concurrency: Option<usize>,

    /// Copy objects to this target (DSN or local path) before deleting
    #[arg(long, value_name = "DSN_OR_PATH")]
    archive_to: Option<String>,

    /// Report intended actions without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Emit the result as JSON
    #[arg(long)]
    json: bool,
}

impl SweepArgs {
    pub async fn run(self, config: &Configuration) -> Result<ExitCode> {
        let target = self.target.open(config)?;
        let policy = self.policy.build(config)?;
        let options = SweepOptions {
            dry_run: self.dry_run || config.sweep.dry_run,
            concurrency: self.concurrency.unwrap_or(config.sweep.concurrency),
        };

        let mut engine = SweepEngine::new(target, policy, options);
        if let Some(location) = self
            .archive_to
            .as_ref()
            .or(config.sweep.archive_to.as_ref())
        {
            engine = engine.with_archiver(Archiver::open(location)?);
        }

        let result = engine.sweep().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            render_summary(&result);
        }

        if result.fully_successful() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::from(1))
        }
    }
}

fn render_summary(result: &SweepResult) {
    let verb = if result.dry_run {
        "would delete"
    } else {
        "deleted"
    };
    println!(
        "Swept {} in {} ms ({})",
        result.target,
        result.duration_ms,
        if result.dry_run { "dry-run" } else { "live" }
    );
    println!(
        "  scanned {}, kept {}, {} {}, archived {}, failed {}, freed {} bytes",
        result.scanned,
        result.kept,
        verb,
        result.deleted,
        result.archived,
        result.failed,
        result.bytes_freed,
    );
    for failure in &result.failures {
        println!("  FAILED ({}) {}: {}", failure.stage, failure.key, failure.error);
    }
}
