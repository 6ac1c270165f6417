//! core::ops
//!
//! Serialization of mutating operations.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive per-weave lock and the scope it drives
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use weavestore::core::ops::{LockScope, StoreLock};
//! use weavestore::transport::LocalTransport;
//! use weavestore::weave::WeaveFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scope = LockScope::new();
//! let _lock = StoreLock::acquire(Path::new("docs/readme.weave"), &scope)?;
//! let mut file = WeaveFile::open_scoped(
//!     "readme",
//!     Arc::new(LocalTransport::new("docs")),
//!     Default::default(),
//!     true,
//!     Some(scope.as_scope()),
//! )?;
//! file.add("v1", &[], &[b"hello\n".to_vec()])?;
//! # Ok(())
//! # }
//! ```

pub mod lock;

pub use lock::{lock_path, LockError, LockScope, StoreLock};
