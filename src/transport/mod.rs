//! transport
//!
//! Byte storage abstraction for persisted weaves.
//!
//! # Architecture
//!
//! Weave files are read and written through the [`Transport`] trait, which
//! has two implementations:
//!
//! - [`LocalTransport`]: A directory on the local filesystem
//! - [`MemoryTransport`]: An in-memory map, for tests and embedding
//!
//! # Example
//!
//! ```
//! use weavestore::transport::{MemoryTransport, Transport};
//!
//! let transport = MemoryTransport::new();
//! transport.put_bytes("notes.weave", b"# weave file v5\nw\nW\n").unwrap();
//! assert!(transport.has("notes.weave").unwrap());
//! ```

mod local;
mod memory;
mod traits;

pub use local::LocalTransport;
pub use memory::MemoryTransport;
pub use traits::{parent_dir, Transport, TransportError};
