//! ui
//!
//! User-facing output for the `weave` binary.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display

pub mod output;
