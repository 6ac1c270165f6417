//! weave::check
//!
//! Integrity verification of a whole weave.
//!
//! # Checks
//!
//! - **Structural**: every parent index is below its child's index, and the
//!   ancestry built forward from parent links matches the inclusions the
//!   engine computes
//! - **Content**: one walk over the stream hashes the active lines of every
//!   version at once and compares each digest with the stored checksum
//!
//! # Invariants
//!
//! - Never mutates the weave
//! - Content checks are skipped when the structure is already broken

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::WeaveError;
use super::interpret::Walk;
use super::Weave;
use crate::core::hash::LineDigest;
use crate::core::types::Checksum;

/// One problem found by [`Weave::check_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckFailure {
    /// A version lists a parent that is not older than itself.
    InvalidParent { version: String, parent: usize },

    /// Forward-built ancestry disagrees with the computed inclusions.
    AncestryMismatch {
        version: String,
        structural: Vec<String>,
        computed: Vec<String>,
    },

    /// The instruction stream is malformed.
    Format { message: String },

    /// A version's active lines do not hash to its checksum.
    Checksum {
        version: String,
        expected: Checksum,
        measured: Checksum,
    },
}

impl From<CheckFailure> for WeaveError {
    fn from(failure: CheckFailure) -> Self {
        match failure {
            CheckFailure::InvalidParent { version, parent } => WeaveError::format(format!(
                "invalid included version {} for {}",
                parent, version
            )),
            CheckFailure::AncestryMismatch {
                version,
                structural,
                computed,
            } => WeaveError::format(format!(
                "ancestry of {} is {:?} but inclusions are {:?}",
                version, structural, computed
            )),
            CheckFailure::Format { message } => WeaveError::Format(message),
            CheckFailure::Checksum {
                version,
                expected,
                measured,
            } => WeaveError::ChecksumMismatch {
                version,
                expected,
                measured,
            },
        }
    }
}

/// Result of a full check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Whether every check passed
    pub ok: bool,
    /// Number of versions checked
    pub versions: usize,
    /// Problems found, in discovery order
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    /// Create a successful report.
    pub fn success(versions: usize) -> Self {
        Self {
            ok: true,
            versions,
            failures: vec![],
        }
    }

    /// Create a failed report.
    pub fn failure(versions: usize, failures: Vec<CheckFailure>) -> Self {
        Self {
            ok: false,
            versions,
            failures,
        }
    }

    fn from_failures(versions: usize, failures: Vec<CheckFailure>) -> Self {
        if failures.is_empty() {
            Self::success(versions)
        } else {
            Self::failure(versions, failures)
        }
    }
}

impl Weave {
    /// Verify the whole weave, returning the first problem as an error.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::Format`] for structural problems
    /// - [`WeaveError::ChecksumMismatch`] for corrupt content
    pub fn check(&self) -> Result<(), WeaveError> {
        match self.check_report().failures.into_iter().next() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    /// Verify the whole weave, collecting every problem.
    pub fn check_report(&self) -> CheckReport {
        let count = self.len();
        let mut failures = Vec::new();

        for (version, parents) in self.parents.iter().enumerate() {
            if let Some(&parent) = parents.iter().max() {
                if parent >= version {
                    failures.push(CheckFailure::InvalidParent {
                        version: self.names[version].to_string(),
                        parent,
                    });
                }
            }
        }
        if !failures.is_empty() {
            return CheckReport::failure(count, failures);
        }

        // Forward-built ancestry; parents are already complete when reached
        let mut ancestry: Vec<HashSet<usize>> = Vec::with_capacity(count);
        for version in 0..count {
            let mut included = HashSet::from([version]);
            for &p in &self.parents[version] {
                included.extend(ancestry[p].iter().copied());
            }
            let computed = self.inclusions(&[version]);
            if included != computed {
                failures.push(CheckFailure::AncestryMismatch {
                    version: self.names[version].to_string(),
                    structural: self.sorted_names(&included),
                    computed: self.sorted_names(&computed),
                });
            }
            ancestry.push(included);
        }

        let mut digests: Vec<Box<dyn LineDigest>> =
            (0..count).map(|_| self.hasher.digest()).collect();
        for item in Walk::new(&self.stream) {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    failures.push(CheckFailure::Format {
                        message: err.to_string(),
                    });
                    return CheckReport::failure(count, failures);
                }
            };
            for (version, included) in ancestry.iter().enumerate() {
                // No resurrection: a deletion by any ancestor hides the line
                if included.contains(&item.inserted)
                    && !item.deleted.iter().any(|d| included.contains(d))
                {
                    digests[version].feed(item.line);
                }
            }
        }

        for (version, digest) in digests.into_iter().enumerate() {
            let measured = digest.finish();
            let expected = &self.checksums[version];
            if &measured != expected {
                warn!(
                    weave = self.label(),
                    version = %self.names[version],
                    expected = %expected,
                    measured = %measured,
                    "checksum mismatch"
                );
                failures.push(CheckFailure::Checksum {
                    version: self.names[version].to_string(),
                    expected: expected.clone(),
                    measured,
                });
            }
        }

        debug!(
            weave = self.label(),
            versions = count,
            failures = failures.len(),
            "checked weave"
        );
        CheckReport::from_failures(count, failures)
    }

    fn sorted_names(&self, indices: &HashSet<usize>) -> Vec<String> {
        let mut sorted: Vec<usize> = indices.iter().copied().collect();
        sorted.sort_unstable();
        sorted
            .into_iter()
            .map(|i| self.names[i].to_string())
            .collect()
    }
}
