//! Core data model shared between the sweep engine and the CLI.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use object_store::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend kind.
///
/// `Fs` and `S3` are selectable from the CLI; `Memory` is only reachable
/// through a `memory://` DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local filesystem.
    Fs,
    /// S3 or S3-compatible object storage.
    S3,
    /// In-memory store.
    #[value(skip)]
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Fs => "fs",
            BackendKind::S3 => "s3",
            BackendKind::Memory => "memory",
        };
        write!(f, "{name}")
    }
}

/// Immutable snapshot of a listed object.
///
/// Created from a listing entry, evaluated exactly once per sweep pass,
/// and discarded when the pass completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogObject {
    /// Object key relative to the target root.
    pub key: String,

    /// Size in bytes as reported by the listing.
    pub size_bytes: u64,

    /// Last modification timestamp.
    pub last_modified: DateTime<Utc>,

    /// Backend the object was listed from.
    pub backend: BackendKind,
}

impl LogObject {
    /// Build a snapshot from a listing entry.
    pub fn from_meta(meta: &ObjectMeta, backend: BackendKind) -> Self {
        Self {
            key: meta.location.to_string(),
            size_bytes: meta.size,
            last_modified: meta.last_modified,
            backend,
        }
    }

    /// Final path segment of the key, used for pattern matching.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}
