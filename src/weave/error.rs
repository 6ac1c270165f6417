//! weave::error
//!
//! Errors raised by the weave engine, serializer and reweaver.

use thiserror::Error;

use crate::core::graph::GraphError;
use crate::core::types::{Checksum, TypeError};

/// Errors from weave operations.
///
/// Every error is raised synchronously at the point of detection. Nothing
/// here is retried or repaired automatically.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// The instruction stream or file violates the format.
    #[error("weave invariant violated: {0}")]
    Format(String),

    /// The input does not start with the weave file marker.
    #[error("not a weave file: {0}")]
    NotAWeaveFile(String),

    /// A version's text does not hash to its stored checksum.
    #[error("text did not match its checksum: version {version}, expected {expected}, measured {measured}")]
    ChecksumMismatch {
        /// Version whose text is corrupt
        version: String,
        /// Checksum recorded when the version was added
        expected: Checksum,
        /// Checksum of the text as extracted now
        measured: Checksum,
    },

    /// A name was re-added with different parents or text.
    #[error("version {{{0}}} already present with different parents or text")]
    DuplicateVersionConflict(String),

    /// A supplied line has a line terminator before its end.
    #[error("line {index} of version {{{version}}} is not a single line: {line:?}")]
    NotALine {
        /// Version being added
        version: String,
        /// Position of the offending line in the supplied text
        index: usize,
        /// The offending line, lossily decoded
        line: String,
    },

    /// `add` referenced a parent the weave does not contain.
    #[error("parent {0} is not present in this weave")]
    UnknownParent(String),

    /// A version name or index is not present.
    #[error("version {{{0}}} not present in this weave")]
    VersionNotPresent(String),

    /// Two weaves disagree on the text of a shared version.
    #[error("weaves differ on text content of version {{{0}}}")]
    TextsDiffer(String),

    /// Two weaves disagree on the parents of a shared version.
    #[error("inconsistent parents for version {{{name}}}: {ours:?} vs {theirs:?}")]
    ParentMismatch {
        name: String,
        ours: Vec<String>,
        theirs: Vec<String>,
    },

    /// A reserved name was looked up without permission.
    #[error("reserved version name: {0}")]
    ReservedNameRejected(String),

    /// Mutation attempted after the owning transaction ended.
    #[error("weave used outside of its transaction")]
    OutsideScope,

    /// Mutation attempted on a read-only weave.
    #[error("weave is read-only")]
    ReadOnly,

    /// A supplied name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// The combined version graph of two weaves has a cycle.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// I/O error while reading or writing the serialized form.
    #[error("weave i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl WeaveError {
    /// Shorthand for a [`WeaveError::Format`] error.
    pub(crate) fn format(what: impl Into<String>) -> Self {
        WeaveError::Format(what.into())
    }
}
