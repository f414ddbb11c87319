//! Retention policy evaluation.

use chrono::{DateTime, Utc};
use common::model::LogObject;
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Decision for a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Object stays.
    Keep,
    /// Object is eligible for deletion.
    Delete,
}

/// Retention rules for one sweep pass.
///
/// Immutable once built. An object is deleted when its age exceeds the
/// max age AND it passes every configured filter (key prefix, file name
/// glob, size threshold).
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    max_age: Duration,
    grace_period: Duration,
    prefix: Option<String>,
    matcher: Option<GlobMatcher>,
    min_size: Option<u64>,
}

impl RetentionPolicy {
    /// Create a policy with the given age threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the age threshold is zero.
    pub fn new(max_age: Duration) -> Result<Self, PolicyError> {
        if max_age.is_zero() {
            return Err(PolicyError::ZeroMaxAge);
        }
        Ok(Self {
            max_age,
            grace_period: Duration::ZERO,
            prefix: None,
            matcher: None,
            min_size: None,
        })
    }

    /// Add a safety margin to the age threshold.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Only delete objects whose key starts with `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Only delete objects whose file name matches `pattern` (glob).
    ///
    /// # Errors
    ///
    /// Returns an error if the glob does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, PolicyError> {
        let glob = Glob::new(pattern).map_err(|e| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.matcher = Some(glob.compile_matcher());
        Ok(self)
    }

    /// Only delete objects strictly larger than `bytes`.
    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = Some(bytes);
        self
    }

    /// Age threshold without the grace period.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Compute the cutoff timestamp for a pass starting at `now`.
    ///
    /// The grace period is added to the age threshold, so the cutoff is
    /// `now - (max_age + grace_period)`.
    ///
    /// # Errors
    ///
    /// Returns an error on duration overflow or timestamp underflow.
    pub fn cutoff_at(&self, now: DateTime<Utc>) -> Result<RetentionCutoff, PolicyError> {
        let effective = self.max_age.checked_add(self.grace_period).ok_or(
            PolicyError::PeriodOverflow {
                max_age: self.max_age,
                grace_period: self.grace_period,
            },
        )?;

        let delta = chrono::Duration::from_std(effective).map_err(|e| {
            PolicyError::DurationConversion {
                duration: effective,
                message: e.to_string(),
            }
        })?;

        let timestamp = now
            .checked_sub_signed(delta)
            .ok_or(PolicyError::CutoffUnderflow {
                effective_retention: effective,
            })?;

        Ok(RetentionCutoff {
            timestamp,
            max_age: self.max_age,
            grace_period: self.grace_period,
        })
    }

    /// Decide whether an object is kept or deleted.
    ///
    /// Pure: no side effects, no I/O, no clock reads; the cutoff carries
    /// the pass's notion of "now".
    pub fn evaluate(&self, object: &LogObject, cutoff: &RetentionCutoff) -> Decision {
        if !cutoff.is_expired(object.last_modified) {
            return Decision::Keep;
        }
        if let Some(prefix) = &self.prefix
            && !object.key.starts_with(prefix.as_str())
        {
            return Decision::Keep;
        }
        if let Some(matcher) = &self.matcher
            && !matcher.is_match(object.file_name())
        {
            return Decision::Keep;
        }
        if let Some(min_size) = self.min_size
            && object.size_bytes <= min_size
        {
            return Decision::Keep;
        }
        Decision::Delete
    }
}

/// Cutoff for one sweep pass; objects modified before it are expired.
#[derive(Debug, Clone)]
pub struct RetentionCutoff {
    /// Objects last modified before this timestamp are expired.
    pub timestamp: DateTime<Utc>,

    /// The age threshold the cutoff was computed from.
    pub max_age: Duration,

    /// Safety margin that was added to the age threshold.
    pub grace_period: Duration,
}

impl RetentionCutoff {
    /// Check whether a modification timestamp falls past the cutoff.
    pub fn is_expired(&self, last_modified: DateTime<Utc>) -> bool {
        last_modified < self.timestamp
    }

    /// Human-readable representation for logging.
    pub fn display(&self) -> String {
        format!(
            "cutoff={}, max_age={}, grace_period={}",
            self.timestamp.to_rfc3339(),
            humantime::format_duration(self.max_age),
            humantime::format_duration(self.grace_period),
        )
    }
}

/// Errors building a policy or computing a cutoff.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Age threshold must be positive.
    #[error("max age must be positive")]
    ZeroMaxAge,

    /// Glob pattern failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Age threshold plus grace period overflowed.
    #[error("retention period overflow: {max_age:?} + grace period {grace_period:?}")]
    PeriodOverflow {
        max_age: Duration,
        grace_period: Duration,
    },

    /// Cutoff timestamp underflow.
    #[error("cutoff timestamp underflow with effective retention {effective_retention:?}")]
    CutoffUnderflow { effective_retention: Duration },

    /// Duration could not be represented for timestamp arithmetic.
    #[error("duration conversion error for {duration:?}: {message}")]
    DurationConversion { duration: Duration, message: String },
}
