use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Storage target configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Default sweep target DSN (`file://`, `s3://` or `memory://`).
    ///
    /// Env: LOGSWEEP__STORAGE__DSN
    #[serde(default)]
    pub dsn: Option<String>,
}

/// Sweep behaviour configuration. CLI flags override these values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Age threshold; objects modified longer ago than this are deleted.
    ///
    /// Env: LOGSWEEP__SWEEP__MAX_AGE
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,

    /// Safety margin added to the age threshold.
    ///
    /// Env: LOGSWEEP__SWEEP__GRACE_PERIOD
    #[serde(with = "humantime_serde", default = "default_grace_period")]
    pub grace_period: Duration,

    /// Only consider objects whose key starts with this prefix.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Only consider objects whose file name matches this glob.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Only consider objects larger than this many bytes.
    #[serde(default)]
    pub min_size: Option<u64>,

    /// Report intended actions without deleting anything.
    ///
    /// Env: LOGSWEEP__SWEEP__DRY_RUN
    #[serde(default)]
    pub dry_run: bool,

    /// Width of the deletion worker pool.
    ///
    /// Env: LOGSWEEP__SWEEP__CONCURRENCY
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Copy objects to this target (DSN or local path) before deleting.
    #[serde(default)]
    pub archive_to: Option<String>,
}

fn default_grace_period() -> Duration {
    Duration::ZERO
}

fn default_concurrency() -> usize {
    8
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30 * 24 * 3600), // 30 days
            grace_period: default_grace_period(),
            prefix: None,
            pattern: None,
            min_size: None,
            dry_run: false,
            concurrency: default_concurrency(),
            archive_to: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Storage target configuration.
    pub storage: StorageConfig,
    /// Sweep behaviour configuration.
    pub sweep: SweepConfig,
}

impl Configuration {
    /// Load configuration from `logsweep.toml` and `LOGSWEEP__` environment
    /// variables, layered over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file("logsweep.toml"))
            .merge(Env::prefixed("LOGSWEEP__").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from an explicit TOML file instead of the default
    /// search path. The file must exist.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LOGSWEEP__").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate the loaded values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep.max_age.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "sweep.max_age",
                message: "must be positive".to_string(),
            });
        }
        if self.sweep.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep.concurrency",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Errors surfaced while loading or validating configuration.
///
/// All of these abort the run before any listing happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("invalid configuration for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("no sweep target: pass --path (with --backend) or set storage.dsn")]
    MissingTarget,
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sweep.max_age, Duration::from_secs(30 * 24 * 3600));
        assert_eq!(config.sweep.concurrency, 8);
        assert!(!config.sweep.dry_run);
        assert!(config.storage.dsn.is_none());
    }

    #[test]
    fn test_zero_max_age_is_invalid() {
        let config = Configuration {
            sweep: SweepConfig {
                max_age: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_invalid() {
        let config = Configuration {
            sweep: SweepConfig {
                concurrency: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "logsweep.toml",
                r#"
                    [storage]
                    dsn = "file:///var/log"

                    [sweep]
                    max_age = "7d"
                    pattern = "*.log"
                "#,
            )?;
            jail.set_env("LOGSWEEP__SWEEP__CONCURRENCY", "4");
            jail.set_env("LOGSWEEP__SWEEP__DRY_RUN", "true");

            let config = Configuration::load().expect("load");
            assert_eq!(config.storage.dsn.as_deref(), Some("file:///var/log"));
            assert_eq!(config.sweep.max_age, Duration::from_secs(7 * 24 * 3600));
            assert_eq!(config.sweep.pattern.as_deref(), Some("*.log"));
            // Env wins over file and defaults
            assert_eq!(config.sweep.concurrency, 4);
            assert!(config.sweep.dry_run);
            Ok(())
        });
    }

    #[test]
    fn test_configless_operation() {
        figment::Jail::expect_with(|_jail| {
            let config = Configuration::load().expect("load");
            assert_eq!(config.sweep.max_age, Duration::from_secs(30 * 24 * 3600));
            Ok(())
        });
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = Configuration::load_from_path(Path::new("/nonexistent/logsweep.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
