//! Sweep engine for expired log objects.
//!
//! Lists a storage target, evaluates each object against a retention
//! policy, and deletes (optionally archiving first) the expired ones.
//! Dry-run mode reports intended actions without mutating anything.

pub mod archive;
pub mod engine;
pub mod metrics;
pub mod policy;

// Re-export commonly used types
pub use archive::Archiver;
pub use engine::{SweepEngine, SweepError, SweepFailure, SweepOptions, SweepResult};
pub use metrics::{MetricsSummary, SweepMetrics};
pub use policy::{Decision, PolicyError, RetentionCutoff, RetentionPolicy};
