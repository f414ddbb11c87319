//! Sweep orchestration.
//!
//! A pass streams the target's listing, evaluates every object exactly
//! once against the retention cutoff, then pushes the delete candidates
//! through a bounded-concurrency pipeline (archive copy first when
//! configured, then delete). Per-object failures are recorded and never
//! abort the pass; a listing failure aborts the pass for the target.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::model::LogObject;
use common::storage::StorageTarget;

use crate::archive::Archiver;
use crate::metrics::SweepMetrics;
use crate::policy::{Decision, PolicyError, RetentionCutoff, RetentionPolicy};

/// Execution options for a sweep pass.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Report intended actions without archiving or deleting.
    pub dry_run: bool,
    /// Width of the deletion worker pool.
    pub concurrency: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: 8,
        }
    }
}

/// Stage at which an object failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Archive,
    Delete,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Archive => write!(f, "archive"),
            FailureStage::Delete => write!(f, "delete"),
        }
    }
}

/// A single object the pass could not process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepFailure {
    pub key: String,
    pub stage: FailureStage,
    pub error: String,
}

/// Aggregated outcome of one sweep pass. Immutable once the pass
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    /// Credential-free form of the swept target.
    pub target: String,
    pub dry_run: bool,
    /// Objects seen by the listing.
    pub scanned: usize,
    /// Objects the policy kept.
    pub kept: usize,
    /// Objects deleted (or simulated in dry-run).
    pub deleted: usize,
    /// Objects copied to the archive target.
    pub archived: usize,
    /// Objects that failed to archive or delete.
    pub failed: usize,
    /// Bytes freed by deletion.
    pub bytes_freed: u64,
    pub failures: Vec<SweepFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl SweepResult {
    /// True when every candidate was processed without error.
    pub fn fully_successful(&self) -> bool {
        self.failed == 0
    }
}

/// Errors that abort a sweep pass.
#[derive(Error, Debug)]
pub enum SweepError {
    /// The listing itself failed; the pass cannot continue for this
    /// target.
    #[error("listing failed for {location}")]
    Listing {
        location: String,
        #[source]
        source: object_store::Error,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

struct Scan {
    scanned: usize,
    kept: usize,
    candidates: Vec<LogObject>,
}

enum Outcome {
    Deleted { bytes: u64, archived: bool },
    Failed(SweepFailure),
}

/// Orchestrates listing, evaluation, archiving and deletion for one
/// target.
pub struct SweepEngine {
    target: StorageTarget,
    policy: RetentionPolicy,
    options: SweepOptions,
    archiver: Option<Archiver>,
    metrics: SweepMetrics,
}

impl SweepEngine {
    pub fn new(target: StorageTarget, policy: RetentionPolicy, options: SweepOptions) -> Self {
        Self {
            target,
            policy,
            options,
            archiver: None,
            metrics: SweepMetrics::new(),
        }
    }

    /// Copy objects to this archive target before deleting them.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// List the objects the policy would delete, without acting on them.
    pub async fn candidates(&self) -> Result<Vec<LogObject>, SweepError> {
        let cutoff = self.policy.cutoff_at(Utc::now())?;
        Ok(self.scan(&cutoff).await?.candidates)
    }

    /// Run one full pass: list, evaluate, archive and delete.
    pub async fn sweep(&self) -> Result<SweepResult, SweepError> {
        let started_at = Utc::now();
        let cutoff = self.policy.cutoff_at(started_at)?;

        tracing::info!(
            target = %self.target.location,
            dry_run = self.options.dry_run,
            concurrency = self.options.concurrency,
            retention = %cutoff.display(),
            "Starting sweep pass"
        );

        let scan = self.scan(&cutoff).await?;
        let mut result = SweepResult {
            target: self.target.location.clone(),
            dry_run: self.options.dry_run,
            scanned: scan.scanned,
            kept: scan.kept,
            deleted: 0,
            archived: 0,
            failed: 0,
            bytes_freed: 0,
            failures: Vec::new(),
            started_at,
            completed_at: started_at,
            duration_ms: 0,
        };

        if scan.candidates.is_empty() {
            tracing::info!(scanned = scan.scanned, "No expired objects to delete");
            return Ok(self.finalize(result));
        }

        tracing::info!(
            candidates = scan.candidates.len(),
            kept = scan.kept,
            "Evaluation complete, processing candidates"
        );

        // Each worker owns its outcome; results are merged once the
        // stream drains.
        let outcomes: Vec<Outcome> = stream::iter(scan.candidates)
            .map(|object| self.process(object))
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Deleted { bytes, archived } => {
                    result.deleted += 1;
                    result.bytes_freed += bytes;
                    if archived {
                        result.archived += 1;
                    }
                }
                Outcome::Failed(failure) => {
                    result.failed += 1;
                    result.failures.push(failure);
                }
            }
        }

        Ok(self.finalize(result))
    }

    fn finalize(&self, mut result: SweepResult) -> SweepResult {
        result.completed_at = Utc::now();
        result.duration_ms = (result.completed_at - result.started_at)
            .num_milliseconds()
            .max(0) as u64;

        self.metrics.record_scanned(result.scanned);
        self.metrics.record_deleted(result.deleted);
        self.metrics.record_archived(result.archived);
        self.metrics.record_failed(result.failed);
        self.metrics.record_bytes_reclaimed(result.bytes_freed);

        tracing::info!(
            target = %result.target,
            kept = result.kept,
            dry_run = result.dry_run,
            duration_ms = result.duration_ms,
            "Sweep pass complete"
        );
        self.metrics.summary().log();
        result
    }

    /// Stream the listing and evaluate every object exactly once.
    async fn scan(&self, cutoff: &RetentionCutoff) -> Result<Scan, SweepError> {
        let mut listing = self.target.store.list(self.target.root.as_ref());
        let mut scan = Scan {
            scanned: 0,
            kept: 0,
            candidates: Vec::new(),
        };

        while let Some(entry) = listing.next().await {
            let meta = entry.map_err(|source| SweepError::Listing {
                location: self.target.location.clone(),
                source,
            })?;
            scan.scanned += 1;

            let object = LogObject::from_meta(&meta, self.target.backend);
            match self.policy.evaluate(&object, cutoff) {
                Decision::Keep => scan.kept += 1,
                Decision::Delete => scan.candidates.push(object),
            }
        }

        Ok(scan)
    }

    /// Archive (when configured) and delete one candidate.
    async fn process(&self, object: LogObject) -> Outcome {
        if self.options.dry_run {
            tracing::info!(
                key = %object.key,
                size_bytes = object.size_bytes,
                last_modified = %object.last_modified,
                archive = self.archiver.is_some(),
                "[DRY-RUN] Would delete expired object"
            );
            return Outcome::Deleted {
                bytes: object.size_bytes,
                archived: false,
            };
        }

        let mut archived = false;
        if let Some(archiver) = &self.archiver {
            match archiver.archive(&self.target.store, &object.key).await {
                Ok(()) => {
                    tracing::debug!(
                        key = %object.key,
                        archive = %archiver.location(),
                        "Archived object"
                    );
                    archived = true;
                }
                Err(e) => {
                    // Never delete an object whose archive copy failed
                    tracing::error!(
                        key = %object.key,
                        error = %e,
                        "Failed to archive object, skipping deletion"
                    );
                    return Outcome::Failed(SweepFailure {
                        key: object.key,
                        stage: FailureStage::Archive,
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        match self
            .target
            .store
            .delete(&ObjectPath::from(object.key.as_str()))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    key = %object.key,
                    size_bytes = object.size_bytes,
                    "Deleted expired object"
                );
                Outcome::Deleted {
                    bytes: object.size_bytes,
                    archived,
                }
            }
            Err(e) => {
                tracing::error!(
                    key = %object.key,
                    error = %e,
                    "Failed to delete object"
                );
                Outcome::Failed(SweepFailure {
                    key: object.key,
                    stage: FailureStage::Delete,
                    error: e.to_string(),
                })
            }
        }
    }
}
