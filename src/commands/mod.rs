pub mod config;
pub mod list;
pub mod sweep;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use common::config::{ConfigError, Configuration};
use common::model::BackendKind;
use common::storage::{self, StorageError, StorageTarget};
use sweeper::policy::{PolicyError, RetentionPolicy};

/// logsweep: sweep expired log objects from filesystem or S3 storage
#[derive(Parser, Debug)]
#[command(name = "logsweep", version, about)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, env = "LOGSWEEP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete expired objects, optionally archiving them first
    Sweep(sweep::SweepArgs),
    /// Show delete candidates without acting on them
    List(list::ListArgs),
    /// Show the effective configuration
    Config {
        /// Show configuration in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        init_logging(self.verbose, self.quiet);

        let config = load_config(self.config.as_deref())?;
        config.validate()?;

        match self.command {
            Commands::Sweep(args) => args.run(&config).await,
            Commands::List(args) => args.run(&config).await,
            Commands::Config { json } => config::run(&config, json),
        }
    }
}

/// Target selection shared by `sweep` and `list`. Falls back to
/// `storage.dsn` from the configuration when no path is given.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Storage backend kind
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Root directory, bucket[/prefix], or DSN to sweep
    #[arg(long)]
    path: Option<String>,
}

impl TargetArgs {
    pub fn open(&self, config: &Configuration) -> anyhow::Result<StorageTarget> {
        let dsn = match &self.path {
            Some(path) => storage::dsn_for(self.backend, path)?,
            None => config
                .storage
                .dsn
                .clone()
                .ok_or(ConfigError::MissingTarget)?,
        };
        Ok(storage::open_dsn(&dsn)?)
    }
}

/// Retention knobs shared by `sweep` and `list`. Flags override the
/// configuration file.
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Age threshold, e.g. 30d, 12h, 30m
    #[arg(long, value_parser = humantime::parse_duration)]
    max_age: Option<Duration>,

    /// Safety margin added to the age threshold
    #[arg(long, value_parser = humantime::parse_duration)]
    grace_period: Option<Duration>,

    /// Only consider keys starting with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Only consider file names matching this glob, e.g. '*.log'
    #[arg(long)]
    pattern: Option<String>,

    /// Only consider objects larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    min_size: Option<u64>,
}

impl PolicyArgs {
    pub fn build(&self, config: &Configuration) -> Result<RetentionPolicy, PolicyError> {
        let sweep = &config.sweep;

        let mut policy = RetentionPolicy::new(self.max_age.unwrap_or(sweep.max_age))?
            .with_grace_period(self.grace_period.unwrap_or(sweep.grace_period));

        if let Some(prefix) = self.prefix.as_ref().or(sweep.prefix.as_ref()) {
            policy = policy.with_prefix(prefix.clone());
        }
        if let Some(pattern) = self.pattern.as_ref().or(sweep.pattern.as_ref()) {
            policy = policy.with_pattern(pattern)?;
        }
        if let Some(min_size) = self.min_size.or(sweep.min_size) {
            policy = policy.with_min_size(min_size);
        }
        Ok(policy)
    }
}

/// Map an escaped error to the process exit code: configuration and
/// argument problems exit 2, runtime failures exit 1.
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    ExitCode::from(error_code(error))
}

fn error_code(error: &anyhow::Error) -> u8 {
    let configuration = error.chain().any(|cause| {
        cause.is::<ConfigError>() || cause.is::<StorageError>() || cause.is::<PolicyError>()
    });
    if configuration { 2 } else { 1 }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Configuration, ConfigError> {
    match path {
        Some(path) => Configuration::load_from_path(path),
        None => Configuration::load(),
    }
}
