//! weave::reweave
//!
//! Combining weaves that evolved independently.
//!
//! # Operations
//!
//! - [`reweave`] builds a new weave holding every version of both inputs,
//!   with the union of each version's parents from either side
//! - [`Weave::join`] brings the versions of another weave into this one,
//!   appending where possible and reweaving when parents disagree
//!
//! Versions present on both sides must have identical text. The check is
//! never resolved automatically.

use tracing::debug;

use super::error::WeaveError;
use super::Weave;
use crate::core::graph::VersionGraph;
use crate::core::hash::checksum_lines;
use crate::core::types::VersionName;

/// Combine two weaves into a new one.
///
/// The result uses `a`'s capabilities. Versions are replayed in a
/// topological order of the combined parent graph, preferring the order in
/// which names first appear in `a` and then `b`.
///
/// # Errors
///
/// - [`WeaveError::TextsDiffer`] if a shared version has different text
/// - [`WeaveError::ChecksumMismatch`] if either input is corrupt
/// - [`WeaveError::Graph`] if the combined parents form a cycle
///
/// # Example
///
/// ```
/// use weavestore::weave::{reweave::reweave, Weave};
///
/// let mut a = Weave::new();
/// a.add("A", &[], &[b"a\n".to_vec()]).unwrap();
/// a.add("B", &["A"], &[b"a\n".to_vec(), b"b\n".to_vec()]).unwrap();
///
/// let mut b = Weave::new();
/// b.add("A", &[], &[b"a\n".to_vec()]).unwrap();
/// b.add("C", &["A"], &[b"c\n".to_vec(), b"a\n".to_vec()]).unwrap();
///
/// let combined = reweave(&a, &b).unwrap();
/// assert_eq!(combined.len(), 3);
/// assert_eq!(combined.get("C").unwrap(), vec![b"c\n".to_vec(), b"a\n".to_vec()]);
/// ```
pub fn reweave(a: &Weave, b: &Weave) -> Result<Weave, WeaveError> {
    let graph = combined_parent_graph(a, b);
    let order = graph.topological_order()?;
    debug!(
        a = a.label(),
        b = b.label(),
        order = ?order.iter().map(VersionName::as_str).collect::<Vec<_>>(),
        "order to reweave"
    );

    let mut result = a.empty_like();
    for name in &order {
        let lines = match (a.name_map.get(name), b.name_map.get(name)) {
            (Some(&ia), Some(&ib)) => {
                let lines = a.get_by_index(ia)?;
                if lines != b.get_by_index(ib)? {
                    debug!(version = %name, a = a.label(), b = b.label(), "weaves differ on content");
                    return Err(WeaveError::TextsDiffer(name.to_string()));
                }
                lines
            }
            (Some(&ia), None) => a.get_by_index(ia)?,
            (None, Some(&ib)) => b.get_by_index(ib)?,
            (None, None) => return Err(WeaveError::VersionNotPresent(name.to_string())),
        };
        let parents = graph
            .parents(name)
            .iter()
            .map(|p| {
                result
                    .name_map
                    .get(p)
                    .copied()
                    .ok_or_else(|| WeaveError::UnknownParent(p.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        result.add_with_parent_indices(name.as_str(), &parents, &lines)?;
    }
    Ok(result)
}

/// Every version of both weaves with the union of its parents.
fn combined_parent_graph(a: &Weave, b: &Weave) -> VersionGraph {
    let mut graph = VersionGraph::new();
    for weave in [a, b] {
        for (index, name) in weave.names.iter().enumerate() {
            graph.add_node(name);
            for &p in &weave.parents[index] {
                graph.add_edge(name, &weave.names[p]);
            }
        }
    }
    graph
}

impl Weave {
    /// Bring every version of `other` into this weave.
    ///
    /// An empty weave takes a copy of `other`. Otherwise each version of
    /// `other` must either be absent here or have the same text and a parent
    /// set that is a subset of ours. Absent versions are appended. If some
    /// shared version has parents we lack, the two weaves are reweaved and
    /// this weave's content is replaced by the result.
    ///
    /// Capabilities, options and scope of this weave are kept throughout;
    /// versions copied from a weave with another hash are re-checksummed.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::TextsDiffer`] if a shared version has different text
    /// - [`WeaveError::OutsideScope`] or [`WeaveError::ReadOnly`]
    pub fn join(&mut self, other: &Weave) -> Result<(), WeaveError> {
        self.check_write_ok()?;
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            debug!(weave = self.label(), from = other.label(), "copying weave content");
            let checksums = if self.hash_algorithm() == other.hash_algorithm() {
                other.checksums.clone()
            } else {
                (0..other.len())
                    .map(|i| Ok(checksum_lines(self.hasher.as_ref(), &other.get_by_index(i)?)))
                    .collect::<Result<Vec<_>, WeaveError>>()?
            };
            self.copy_content_from(other);
            self.checksums = checksums;
            return Ok(());
        }

        // Verify everything before changing anything
        let mut to_join = Vec::new();
        for (other_index, name) in other.names.iter().enumerate() {
            match self.check_version_consistent(other, other_index, name) {
                Ok(true) => {}
                Ok(false) => to_join.push(other_index),
                Err(WeaveError::ParentMismatch { name, .. }) => {
                    debug!(weave = self.label(), version = %name, "parents differ, reweaving");
                    let combined = reweave(self, other)?;
                    self.copy_content_from(&combined);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        for &other_index in &to_join {
            let parents = self.imported_parents(other, other_index)?;
            let lines = other.get_by_index(other_index)?;
            self.add_with_parent_indices(other.names[other_index].as_str(), &parents, &lines)?;
        }
        debug!(
            weave = self.label(),
            from = other.label(),
            merged = to_join.len(),
            processed = other.len(),
            "joined weave"
        );
        Ok(())
    }

    /// Whether a version of `other` is present here and consistent.
    ///
    /// Returns `Ok(false)` if absent. Consistent means identical text and
    /// parent names of `other` that are a subset of ours. Texts are compared
    /// by checksum when both weaves hash alike, and in full otherwise.
    fn check_version_consistent(
        &self,
        other: &Weave,
        other_index: usize,
        name: &VersionName,
    ) -> Result<bool, WeaveError> {
        let Some(&this_index) = self.name_map.get(name) else {
            return Ok(false);
        };
        let same_text = if self.hash_algorithm() == other.hash_algorithm() {
            self.checksums[this_index] == other.checksums[other_index]
        } else {
            self.get_by_index(this_index)? == other.get_by_index(other_index)?
        };
        if !same_text {
            return Err(WeaveError::TextsDiffer(name.to_string()));
        }
        let ours: Vec<&VersionName> = self.parents[this_index]
            .iter()
            .map(|&p| &self.names[p])
            .collect();
        let theirs: Vec<&VersionName> = other.parents[other_index]
            .iter()
            .map(|&p| &other.names[p])
            .collect();
        if theirs.iter().all(|p| ours.contains(p)) {
            Ok(true)
        } else {
            Err(WeaveError::ParentMismatch {
                name: name.to_string(),
                ours: ours.iter().map(|p| p.to_string()).collect(),
                theirs: theirs.iter().map(|p| p.to_string()).collect(),
            })
        }
    }

    /// Indices here of the parents of a version of `other`.
    fn imported_parents(&self, other: &Weave, other_index: usize) -> Result<Vec<usize>, WeaveError> {
        other.parents[other_index]
            .iter()
            .map(|&p| {
                let parent = &other.names[p];
                self.name_map.get(parent).copied().ok_or_else(|| {
                    WeaveError::UnknownParent(format!(
                        "{} (parent of {})",
                        parent, other.names[other_index]
                    ))
                })
            })
            .collect()
    }
}
