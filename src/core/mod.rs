//! core
//!
//! Domain types, capabilities and operations shared by the weave engine.
//!
//! # Modules
//!
//! - [`types`] - Strong types: VersionName, Checksum
//! - [`naming`] - Reserved-name policy
//! - [`hash`] - Content hashing capability
//! - [`graph`] - Version graph and topological ordering
//! - [`scope`] - Transaction scope tokens
//! - [`ops`] - Exclusive per-weave locking
//! - [`config`] - Configuration schema and loading

pub mod config;
pub mod graph;
pub mod hash;
pub mod naming;
pub mod ops;
pub mod scope;
pub mod types;
