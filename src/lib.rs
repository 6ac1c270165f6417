//! weavestore - Weave storage for related revisions of a text file
//!
//! A weave keeps every revision of one text in a single interleaved stream
//! of lines and insert/delete blocks. Any revision can be extracted in one
//! pass, every line carries the revision that introduced it, and merges of
//! two revisions can be planned line by line against their shared history.
//!
//! # Architecture
//!
//! - [`weave`] - The engine: add, extract, annotate, check, merge planning,
//!   serialization, reweave and persisted weave files
//! - [`diff`] - Sequence matchers used when adding revisions
//! - [`core`] - Strong types, hashing, naming policy, version graph, scope
//!   tokens, locking and configuration
//! - [`transport`] - Byte storage for weave files
//! - [`cli`] - The `weave` command-line interface
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every parent precedes its child
//! 2. Every revision's checksum matches the text extracted for it
//! 3. Stored weaves are rewritten whole, never partially
//! 4. Mutations are refused outside the transaction the weave was opened in

pub mod cli;
pub mod core;
pub mod diff;
pub mod transport;
pub mod ui;
pub mod weave;
