use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use common::config::Configuration;
use common::model::LogObject;
use sweeper::{SweepEngine, SweepOptions};

use super::{PolicyArgs, TargetArgs};

/// Show delete candidates without acting on them.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Emit the candidates as JSON
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    pub async fn run(self, config: &Configuration) -> Result<ExitCode> {
        let target = self.target.open(config)?;
        let policy = self.policy.build(config)?;

        let engine = SweepEngine::new(
            target,
            policy,
            SweepOptions {
                dry_run: true,
                concurrency: 1,
            },
        );

        let mut candidates = engine.candidates().await?;
        candidates.sort_by_key(|object| object.last_modified);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&candidates)?);
        } else {
            render_table(&candidates);
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn render_table(candidates: &[LogObject]) {
    if !candidates.is_empty() {
        println!("{:<60} {:>14}  {}", "KEY", "SIZE (BYTES)", "MODIFIED (UTC)");
        for object in candidates {
            println!(
                "{:<60} {:>14}  {}",
                object.key,
                object.size_bytes,
                object.last_modified.format("%Y-%m-%d %H:%M:%S"),
            );
        }
    }
    println!("{} objects matched.", candidates.len());
}
