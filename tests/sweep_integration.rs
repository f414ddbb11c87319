//! End-to-end sweep over a real local filesystem target.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::time::{Duration, SystemTime};

use common::storage::{self, StorageTarget};
use sweeper::{Archiver, RetentionPolicy, SweepEngine, SweepOptions};
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(24 * 3600);

fn write_aged(dir: &Path, name: &str, body: &str, age: Duration) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();

    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

fn open_target(dir: &Path) -> StorageTarget {
    storage::open_dsn(&format!("file://{}", dir.display())).unwrap()
}

#[tokio::test]
async fn sweep_deletes_only_expired_files() {
    let root = TempDir::new().unwrap();
    write_aged(root.path(), "a.log", "ten days old", 10 * DAY);
    write_aged(root.path(), "b.log", "forty days old", 40 * DAY);

    let policy = RetentionPolicy::new(30 * DAY).unwrap();
    let engine = SweepEngine::new(open_target(root.path()), policy, SweepOptions::default());
    let result = engine.sweep().await.unwrap();

    assert_eq!(result.scanned, 2);
    assert_eq!(result.kept, 1);
    assert_eq!(result.deleted, 1);
    assert_eq!(result.bytes_freed, "forty days old".len() as u64);
    assert!(result.fully_successful());

    assert!(root.path().join("a.log").exists());
    assert!(!root.path().join("b.log").exists());
}

#[tokio::test]
async fn dry_run_leaves_files_in_place() {
    let root = TempDir::new().unwrap();
    write_aged(root.path(), "old.log", "old", 40 * DAY);

    let policy = RetentionPolicy::new(30 * DAY).unwrap();
    let options = SweepOptions {
        dry_run: true,
        ..Default::default()
    };
    let engine = SweepEngine::new(open_target(root.path()), policy, options);
    let result = engine.sweep().await.unwrap();

    assert!(result.dry_run);
    assert_eq!(result.deleted, 1);
    assert!(root.path().join("old.log").exists());
}

#[tokio::test]
async fn pattern_restricts_sweep_to_matching_files() {
    let root = TempDir::new().unwrap();
    write_aged(root.path(), "logs/app.log", "expired log", 40 * DAY);
    write_aged(root.path(), "logs/data.db", "not a log", 40 * DAY);

    let policy = RetentionPolicy::new(30 * DAY)
        .unwrap()
        .with_pattern("*.log")
        .unwrap();
    let engine = SweepEngine::new(open_target(root.path()), policy, SweepOptions::default());
    let result = engine.sweep().await.unwrap();

    assert_eq!(result.deleted, 1);
    assert_eq!(result.kept, 1);
    assert!(!root.path().join("logs/app.log").exists());
    assert!(root.path().join("logs/data.db").exists());
}

#[tokio::test]
async fn archive_copies_files_before_deleting() {
    let root = TempDir::new().unwrap();
    let archive = TempDir::new().unwrap();
    write_aged(root.path(), "nginx/access.log", "payload", 40 * DAY);

    let policy = RetentionPolicy::new(30 * DAY).unwrap();
    let archiver = Archiver::open(&archive.path().to_string_lossy()).unwrap();
    let engine = SweepEngine::new(open_target(root.path()), policy, SweepOptions::default())
        .with_archiver(archiver);
    let result = engine.sweep().await.unwrap();

    assert_eq!(result.deleted, 1);
    assert_eq!(result.archived, 1);
    assert!(!root.path().join("nginx/access.log").exists());

    // The archive copy preserves the full key
    let copied = archive.path().join("nginx/access.log");
    assert_eq!(fs::read_to_string(copied).unwrap(), "payload");
}

#[tokio::test]
async fn empty_directory_sweeps_cleanly() {
    let root = TempDir::new().unwrap();

    let policy = RetentionPolicy::new(30 * DAY).unwrap();
    let engine = SweepEngine::new(open_target(root.path()), policy, SweepOptions::default());
    let result = engine.sweep().await.unwrap();

    assert_eq!(result.scanned, 0);
    assert_eq!(result.deleted, 0);
    assert_eq!(result.failed, 0);
    assert!(result.fully_successful());
}
