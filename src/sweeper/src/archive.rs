//! Archive copies of objects scheduled for deletion.

use anyhow::{Context, Result};
use common::storage::{self, StorageError, StorageTarget};
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use std::sync::Arc;

/// Copies objects to an archive target before they are deleted.
///
/// The full object key is preserved under the archive root, so objects
/// with equal file names in different directories never collide.
pub struct Archiver {
    target: StorageTarget,
}

impl Archiver {
    pub fn new(target: StorageTarget) -> Self {
        Self { target }
    }

    /// Open an archive target from a DSN or a local directory path.
    ///
    /// A plain path is created if missing, then opened as a filesystem
    /// target.
    pub fn open(location: &str) -> Result<Self, StorageError> {
        let dsn = if location.contains("://") {
            location.to_string()
        } else {
            std::fs::create_dir_all(location).map_err(|source| StorageError::Path {
                path: location.to_string(),
                source,
            })?;
            storage::dsn_for(None, location)?
        };
        Ok(Self::new(storage::open_dsn(&dsn)?))
    }

    /// Credential-free display form of the archive target.
    pub fn location(&self) -> &str {
        &self.target.location
    }

    /// Copy one object from `source` into the archive target.
    pub async fn archive(&self, source: &Arc<dyn ObjectStore>, key: &str) -> Result<()> {
        let from = ObjectPath::from(key);
        let data = source
            .get(&from)
            .await
            .with_context(|| format!("Failed to read object for archiving: {key}"))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read object body for archiving: {key}"))?;

        let to = match &self.target.root {
            Some(root) => ObjectPath::from(format!("{root}/{key}")),
            None => from,
        };
        self.target
            .store
            .put(&to, data.into())
            .await
            .with_context(|| format!("Failed to write archive copy: {to}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::BackendKind;
    use object_store::memory::InMemory;

    fn memory_target(root: Option<&str>) -> StorageTarget {
        StorageTarget {
            store: Arc::new(InMemory::new()),
            root: root.map(ObjectPath::from),
            backend: BackendKind::Memory,
            location: "memory://".to_string(),
        }
    }

    #[tokio::test]
    async fn test_archive_preserves_key() {
        let source: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        source
            .put(&ObjectPath::from("app/2024/old.log"), "payload".into())
            .await
            .unwrap();

        let archiver = Archiver::new(memory_target(None));
        archiver.archive(&source, "app/2024/old.log").await.unwrap();

        let copied = archiver
            .target
            .store
            .get(&ObjectPath::from("app/2024/old.log"))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&copied[..], b"payload");
    }

    #[tokio::test]
    async fn test_archive_under_root() {
        let source: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        source
            .put(&ObjectPath::from("old.log"), "payload".into())
            .await
            .unwrap();

        let archiver = Archiver::new(memory_target(Some("backups/2026")));
        archiver.archive(&source, "old.log").await.unwrap();

        assert!(
            archiver
                .target
                .store
                .get(&ObjectPath::from("backups/2026/old.log"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_archive_missing_object_fails() {
        let source: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let archiver = Archiver::new(memory_target(None));
        assert!(archiver.archive(&source, "missing.log").await.is_err());
    }

    #[test]
    fn test_open_creates_local_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dest = temp_dir.path().join("archive");

        let archiver = Archiver::open(&dest.to_string_lossy()).unwrap();
        assert!(dest.is_dir());
        assert_eq!(archiver.target.backend, BackendKind::Fs);
    }
}
