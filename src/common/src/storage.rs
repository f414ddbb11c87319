//! Storage backend adapter: DSN parsing and object store construction.
//!
//! Supported DSN forms:
//! - `file:///var/log`: local filesystem rooted at the directory
//! - `s3://bucket[/prefix]`: S3, credentials and region from `AWS_*` env
//! - `s3://key:secret@endpoint[:port]/bucket[/prefix]`: S3-compatible
//!   endpoint (MinIO and friends); selected when the DSN carries userinfo
//!   or an explicit port
//! - `memory://`: in-memory store

use std::sync::Arc;

use object_store::path::Path as ObjectPath;
use object_store::{
    ObjectStore, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory,
};
use thiserror::Error;
use url::Url;

use crate::model::BackendKind;

/// One opened storage backend a sweep pass lists and acts on.
#[derive(Clone)]
pub struct StorageTarget {
    /// Backing store.
    pub store: Arc<dyn ObjectStore>,

    /// Listing prefix within the store, if the DSN carried one.
    pub root: Option<ObjectPath>,

    /// Backend tag stamped onto listed objects.
    pub backend: BackendKind,

    /// Credential-free display form of the target.
    pub location: String,
}

impl std::fmt::Debug for StorageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageTarget")
            .field("backend", &self.backend)
            .field("location", &self.location)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Resolve the CLI's backend/path pair to a DSN.
///
/// A `path` that already is a DSN is validated against the selected
/// backend and passed through. A raw path defaults to the filesystem
/// backend unless `--backend s3` was given, in which case it is read as
/// `bucket[/prefix]`.
pub fn dsn_for(backend: Option<BackendKind>, path: &str) -> Result<String, StorageError> {
    if path.contains("://") {
        let url = parse_dsn(path)?;
        let scheme_kind = kind_for_scheme(url.scheme())?;
        if let Some(kind) = backend
            && kind != scheme_kind
        {
            return Err(StorageError::BackendMismatch {
                backend: kind,
                scheme: url.scheme().to_string(),
            });
        }
        return Ok(path.to_string());
    }

    match backend.unwrap_or(BackendKind::Fs) {
        BackendKind::Fs => {
            let absolute =
                std::fs::canonicalize(path).map_err(|source| StorageError::Path {
                    path: path.to_string(),
                    source,
                })?;
            Ok(format!("file://{}", absolute.display()))
        }
        BackendKind::S3 => {
            let trimmed = path.trim_matches('/');
            if trimmed.is_empty() {
                return Err(StorageError::MissingBucket);
            }
            Ok(format!("s3://{trimmed}"))
        }
        BackendKind::Memory => Ok("memory://".to_string()),
    }
}

/// Open a storage target from a DSN.
pub fn open_dsn(dsn: &str) -> Result<StorageTarget, StorageError> {
    let url = parse_dsn(dsn)?;

    match url.scheme() {
        "file" => open_file(&url, dsn),
        "memory" => Ok(StorageTarget {
            store: Arc::new(InMemory::new()),
            root: None,
            backend: BackendKind::Memory,
            location: "memory://".to_string(),
        }),
        "s3" => open_s3(&url),
        scheme => Err(StorageError::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}

fn parse_dsn(dsn: &str) -> Result<Url, StorageError> {
    Url::parse(dsn).map_err(|e| StorageError::InvalidDsn {
        dsn: dsn.to_string(),
        message: e.to_string(),
    })
}

fn kind_for_scheme(scheme: &str) -> Result<BackendKind, StorageError> {
    match scheme {
        "file" => Ok(BackendKind::Fs),
        "s3" => Ok(BackendKind::S3),
        "memory" => Ok(BackendKind::Memory),
        other => Err(StorageError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}

fn open_file(url: &Url, dsn: &str) -> Result<StorageTarget, StorageError> {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return Err(StorageError::MissingPath);
    }
    // file:///.data/logs means a path relative to the working directory
    let path = if path.starts_with("/.") { &path[1..] } else { path };

    let store = LocalFileSystem::new_with_prefix(path)?;
    Ok(StorageTarget {
        store: Arc::new(store),
        root: None,
        backend: BackendKind::Fs,
        location: dsn.to_string(),
    })
}

fn open_s3(url: &Url) -> Result<StorageTarget, StorageError> {
    let host = url.host_str().ok_or(StorageError::MissingBucket)?;
    let segments: Vec<&str> = url
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // Userinfo or an explicit port mark the host as an S3-compatible
    // endpoint; otherwise the host is the bucket itself.
    let endpoint_form = !url.username().is_empty() || url.port().is_some();

    let mut builder = AmazonS3Builder::from_env();
    if std::env::var("AWS_REGION").is_err() && std::env::var("AWS_DEFAULT_REGION").is_err() {
        builder = builder.with_region("us-east-1");
    }

    let (bucket, prefix, location) = if endpoint_form {
        let bucket = *segments.first().ok_or(StorageError::MissingBucket)?;
        let prefix = segments[1..].join("/");

        let scheme = if url.port() == Some(443) { "https" } else { "http" };
        let endpoint = match url.port() {
            Some(port) => format!("{scheme}://{host}:{port}"),
            None => format!("{scheme}://{host}"),
        };
        // MinIO requires path-style requests
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(true)
            .with_virtual_hosted_style_request(false);

        if !url.username().is_empty() {
            builder = builder
                .with_access_key_id(url.username())
                .with_secret_access_key(url.password().unwrap_or(""));
        }

        let location = match url.port() {
            Some(port) => format!("s3://{host}:{port}/{}", segments.join("/")),
            None => format!("s3://{host}/{}", segments.join("/")),
        };
        (bucket.to_string(), prefix, location)
    } else {
        let prefix = segments.join("/");
        let location = if prefix.is_empty() {
            format!("s3://{host}")
        } else {
            format!("s3://{host}/{prefix}")
        };
        (host.to_string(), prefix, location)
    };

    let store = builder.with_bucket_name(bucket).build()?;
    let root = if prefix.is_empty() {
        None
    } else {
        Some(ObjectPath::from(prefix))
    };

    Ok(StorageTarget {
        store: Arc::new(store),
        root,
        backend: BackendKind::S3,
        location,
    })
}

/// Errors while resolving or opening a storage target.
///
/// All of these are configuration errors: they abort the run before any
/// listing happens.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid storage DSN '{dsn}': {message}")]
    InvalidDsn { dsn: String, message: String },

    #[error("unsupported storage scheme '{scheme}', supported: file, memory, s3")]
    UnsupportedScheme { scheme: String },

    #[error("file DSN must specify a directory: file:///path/to/logs")]
    MissingPath,

    #[error("S3 DSN must specify a bucket: s3://bucket[/prefix]")]
    MissingBucket,

    #[error("backend '{backend}' does not match DSN scheme '{scheme}'")]
    BackendMismatch {
        backend: BackendKind,
        scheme: String,
    },

    #[error("cannot resolve path '{path}': {source}")]
    Path {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Backend(#[from] object_store::Error),
}
