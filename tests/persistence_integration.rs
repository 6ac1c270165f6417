//! Integration tests for the persistence layer.
//!
//! These tests exercise WeaveFile, LocalTransport and StoreLock against
//! real directories created with tempfile.

use std::sync::Arc;

use tempfile::TempDir;

use weavestore::core::hash::HashAlgorithm;
use weavestore::core::ops::{LockError, LockScope, StoreLock};
use weavestore::transport::{LocalTransport, Transport, TransportError};
use weavestore::weave::{
    AccessMode, Weave, WeaveError, WeaveFile, WeaveFileError, WeaveOptions,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn text(lines: &[&str]) -> Vec<Vec<u8>> {
    lines.iter().map(|l| l.as_bytes().to_vec()).collect()
}

struct Store {
    dir: TempDir,
}

impl Store {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    fn transport(&self) -> Arc<LocalTransport> {
        Arc::new(LocalTransport::new(self.dir.path()))
    }

    fn open(&self, create: bool) -> Result<WeaveFile, WeaveFileError> {
        WeaveFile::open("doc", self.transport(), WeaveOptions::default(), create)
    }
}

// =============================================================================
// WeaveFile
// =============================================================================

#[test]
fn every_add_is_persisted() {
    let store = Store::new();
    let mut file = store.open(true).unwrap();
    file.add("v1", &[], &text(&["hello\n"])).unwrap();

    let reopened = store.open(false).unwrap();
    assert_eq!(reopened.get("v1").unwrap(), text(&["hello\n"]));

    file.add("v2", &["v1"], &text(&["hello\n", "world\n"])).unwrap();
    let reopened = store.open(false).unwrap();
    assert_eq!(reopened.weave(), file.weave());
    assert!(reopened.check().is_ok());
}

#[test]
fn weave_file_lands_on_disk() {
    let store = Store::new();
    let mut file = store.open(true).unwrap();
    file.add("v1", &[], &text(&["x\n"])).unwrap();

    let on_disk = std::fs::read(store.dir.path().join("doc.weave")).unwrap();
    assert!(on_disk.starts_with(b"# weave file v5\n"));
    assert!(on_disk.ends_with(b"W\n"));
}

#[test]
fn missing_file_without_create_fails() {
    let store = Store::new();
    assert!(matches!(
        store.open(false),
        Err(WeaveFileError::Transport(TransportError::NoSuchFile(_)))
    ));
}

#[test]
fn hash_option_is_used_for_new_versions() {
    let store = Store::new();
    let options = WeaveOptions {
        hash: HashAlgorithm::Sha256,
        ..Default::default()
    };
    let mut file = WeaveFile::open("doc", store.transport(), options, true).unwrap();
    file.add("v1", &[], &text(&["x\n"])).unwrap();
    assert_eq!(file.checksum("v1").unwrap().as_str().len(), 64);

    let reopened = WeaveFile::open("doc", store.transport(), options, false).unwrap();
    assert!(reopened.get("v1").is_ok());
}

#[test]
fn sha256_weave_reopens_under_default_options() {
    let store = Store::new();
    let options = WeaveOptions {
        hash: HashAlgorithm::Sha256,
        ..Default::default()
    };
    let mut file = WeaveFile::open("doc", store.transport(), options, true).unwrap();
    file.add("v1", &[], &text(&["a\n"])).unwrap();
    drop(file);

    let mut reopened = store.open(false).unwrap();
    assert_eq!(reopened.hash_algorithm(), HashAlgorithm::Sha256);
    assert_eq!(reopened.get("v1").unwrap(), text(&["a\n"]));
    reopened.check().unwrap();
    reopened.add("v2", &["v1"], &text(&["a\n", "b\n"])).unwrap();
    assert!(store.open(false).unwrap().check().is_ok());
}

#[test]
fn multi_line_entry_never_reaches_disk() {
    let store = Store::new();
    let mut file = store.open(true).unwrap();
    file.add("v1", &[], &text(&["a\n"])).unwrap();
    assert!(matches!(
        file.add("v2", &["v1"], &[b"one\ntwo\n".to_vec()]),
        Err(WeaveFileError::Weave(WeaveError::NotALine { .. }))
    ));

    let reopened = store.open(false).unwrap();
    assert_eq!(reopened.versions().len(), 1);
}

#[test]
fn read_only_file_refuses_add() {
    let store = Store::new();
    store.open(true).unwrap();
    let options = WeaveOptions {
        access_mode: AccessMode::ReadOnly,
        ..Default::default()
    };
    let mut file = WeaveFile::open("doc", store.transport(), options, false).unwrap();
    assert!(matches!(
        file.add("v1", &[], &text(&["x\n"])),
        Err(WeaveFileError::Weave(WeaveError::ReadOnly))
    ));
}

#[test]
fn copy_to_another_directory() {
    let store = Store::new();
    let mut file = store.open(true).unwrap();
    file.add("v1", &[], &text(&["x\n"])).unwrap();

    let other = TempDir::new().unwrap();
    let transport = LocalTransport::new(other.path());
    file.copy_to("copy", &transport).unwrap();
    assert!(transport.has("copy.weave").unwrap());
}

#[test]
fn join_persists_imported_versions() {
    let store = Store::new();
    let mut file = store.open(true).unwrap();
    file.add("base", &[], &text(&["a\n"])).unwrap();

    let mut other = Weave::new();
    other.add("base", &[], &text(&["a\n"])).unwrap();
    other.add("theirs", &["base"], &text(&["a\n", "b\n"])).unwrap();
    file.join(&other).unwrap();

    let reopened = store.open(false).unwrap();
    assert_eq!(reopened.get("theirs").unwrap(), text(&["a\n", "b\n"]));
}

// =============================================================================
// StoreLock and scope
// =============================================================================

#[test]
fn second_lock_on_same_weave_fails() {
    let store = Store::new();
    let path = store.dir.path().join("doc.weave");
    let _held = StoreLock::acquire(&path, &LockScope::new()).unwrap();
    assert!(matches!(
        StoreLock::acquire(&path, &LockScope::new()),
        Err(LockError::AlreadyLocked(_))
    ));
}

#[test]
fn weave_opened_under_lock_can_be_mutated() {
    let store = Store::new();
    let path = store.dir.path().join("doc.weave");
    let scope = LockScope::new();
    let _lock = StoreLock::acquire(&path, &scope).unwrap();

    let mut file = WeaveFile::open_scoped(
        "doc",
        store.transport(),
        WeaveOptions::default(),
        true,
        Some(scope.as_scope()),
    )
    .unwrap();
    file.add("v1", &[], &text(&["x\n"])).unwrap();
}

#[test]
fn weave_refuses_mutation_after_lock_release() {
    let store = Store::new();
    let path = store.dir.path().join("doc.weave");
    let scope = LockScope::new();
    let mut lock = StoreLock::acquire(&path, &scope).unwrap();

    let mut file = WeaveFile::open_scoped(
        "doc",
        store.transport(),
        WeaveOptions::default(),
        true,
        Some(scope.as_scope()),
    )
    .unwrap();
    lock.release().unwrap();

    assert!(matches!(
        file.add("v1", &[], &text(&["x\n"])),
        Err(WeaveFileError::Weave(WeaveError::OutsideScope))
    ));
    assert!(file.is_empty());
}

#[test]
fn weave_refuses_mutation_under_a_later_lock() {
    let store = Store::new();
    let path = store.dir.path().join("doc.weave");
    let scope = LockScope::new();
    let first = StoreLock::acquire(&path, &scope).unwrap();
    let mut file = WeaveFile::open_scoped(
        "doc",
        store.transport(),
        WeaveOptions::default(),
        true,
        Some(scope.as_scope()),
    )
    .unwrap();
    drop(first);

    let _second = StoreLock::acquire(&path, &scope).unwrap();
    assert!(matches!(
        file.add("v1", &[], &text(&["x\n"])),
        Err(WeaveFileError::Weave(WeaveError::OutsideScope))
    ));
}
