//! core::ops::lock
//!
//! Exclusive per-weave lock for mutating operations.
//!
//! # Architecture
//!
//! A weave file never locks itself. Callers that mutate a stored weave take
//! a [`StoreLock`] first and open the weave bound to the lock's
//! [`LockScope`]. Each acquisition starts a new generation in the scope, and
//! releasing the lock detaches it, so a weave opened under one acquisition
//! refuses to save under any other.
//!
//! # Storage
//!
//! - `<dir>/<name>.weave.lock` - Lock file with OS-level exclusive lock
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - The scope reports [`ScopeToken::DETACHED`] whenever no lock is held

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

use crate::core::scope::{Scope, ScopeToken};

/// Suffix appended to the weave path to form the lock path.
pub const LOCK_SUFFIX: &str = ".lock";

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("weave is locked by another process: {0}")]
    AlreadyLocked(PathBuf),

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

#[derive(Debug, Default)]
struct Generations {
    current: AtomicU64,
    next: AtomicU64,
}

/// Transaction scope driven by [`StoreLock`].
///
/// Cloning shares the same generation counter.
#[derive(Debug, Clone, Default)]
pub struct LockScope {
    inner: Arc<Generations>,
}

impl LockScope {
    /// Create a detached scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// This scope as a shared [`Scope`] capability.
    pub fn as_scope(&self) -> Arc<dyn Scope> {
        Arc::new(self.clone())
    }

    fn begin(&self) -> ScopeToken {
        let generation = self.inner.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.current.store(generation, Ordering::SeqCst);
        ScopeToken::new(generation)
    }

    fn end(&self) {
        self.inner.current.store(0, Ordering::SeqCst);
    }
}

impl Scope for LockScope {
    fn current(&self) -> ScopeToken {
        ScopeToken::new(self.inner.current.load(Ordering::SeqCst))
    }
}

/// An exclusive lock on one weave file.
///
/// The lock is released when this guard is dropped.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    file: Option<File>,
    scope: LockScope,
}

impl StoreLock {
    /// Lock the weave stored at `weave_path`.
    ///
    /// The lock file sits beside the weave. On success `scope` enters a new
    /// generation.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(weave_path: &Path, scope: &LockScope) -> Result<Self, LockError> {
        let path = lock_path(weave_path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                let token = scope.begin();
                debug!(lock = %path.display(), scope = %token, "acquired weave lock");
                Ok(Self {
                    path,
                    file: Some(file),
                    scope: scope.clone(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked(path))
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            self.scope.end();
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
            debug!(lock = %self.path.display(), "released weave lock");
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            self.scope.end();
            let _ = file.unlock();
        }
    }
}

/// Lock file path for a weave file path.
pub fn lock_path(weave_path: &Path) -> PathBuf {
    let mut name = weave_path.as_os_str().to_owned();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}
