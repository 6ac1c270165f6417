//! weave
//!
//! The weave engine: many revisions of one text in a single stream.
//!
//! # Architecture
//!
//! A [`Weave`] keeps parallel per-version tables (parents, checksums, names)
//! and one shared instruction stream. Every version is encoded as insert and
//! delete blocks tagged with its index, interleaved with the literal lines of
//! every other version. Extracting a version means evaluating the stream for
//! its ancestry (see [`interpret`]).
//!
//! # Modules
//!
//! - [`instruction`] - Stream elements
//! - [`interpret`] - Stream evaluation for one or many targets
//! - [`check`] - Integrity verification reports
//! - [`plan`] - Three-way merge planning and text merge
//! - [`format`] - The v5 text serialization
//! - [`reweave`] - Combining independently evolved weaves
//! - [`file`] - A weave persisted through a transport
//!
//! # Invariants
//!
//! - Insert blocks nest; delete blocks need not
//! - Every parent index is below its child's index
//! - A version's checksum is the hash of exactly its active lines
//! - Names are unique
//!
//! # Example
//!
//! ```
//! use weavestore::weave::Weave;
//!
//! let mut weave = Weave::new();
//! weave.add("text0", &[], &[b"line 1\n".to_vec()]).unwrap();
//! weave
//!     .add("text1", &["text0"], &[b"line 1\n".to_vec(), b"line 2\n".to_vec()])
//!     .unwrap();
//!
//! let annotated = weave.annotate("text1").unwrap();
//! assert_eq!(annotated[0].0.as_str(), "text0");
//! assert_eq!(annotated[1].0.as_str(), "text1");
//! ```

pub mod check;
pub mod error;
pub mod file;
pub mod format;
pub mod instruction;
pub mod interpret;
pub mod plan;
pub mod reweave;

pub use check::{CheckFailure, CheckReport};
pub use error::WeaveError;
pub use file::{WeaveFile, WeaveFileError};
pub use instruction::Instruction;
pub use plan::{MergeOutcome, MergeState};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::hash::{checksum_lines, ContentHasher, HashAlgorithm, Sha1Hasher};
use crate::core::naming::{NamePolicy, ReservedSuffix};
use crate::core::scope::{Scope, ScopeToken, Unscoped};
use crate::core::types::{Checksum, VersionName};
use crate::diff::{MatcherKind, OpTag, PatienceMatcher, SequenceMatcher};

use interpret::extract;

/// Whether a weave may be mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    Write,
    ReadOnly,
}

/// Capabilities a weave is built with, in configurable form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeaveOptions {
    pub hash: HashAlgorithm,
    pub matcher: MatcherKind,
    pub allow_reserved: bool,
    pub access_mode: AccessMode,
}

/// Split text into lines, keeping each line's `\n` terminator.
///
/// A final line without terminator is kept as is.
pub fn split_lines(text: &[u8]) -> Vec<Vec<u8>> {
    text.split_inclusive(|&b| b == b'\n')
        .map(<[u8]>::to_vec)
        .collect()
}

/// Every line may carry a `\n` only as its last byte.
fn check_lines_are_lines(name: &VersionName, lines: &[Vec<u8>]) -> Result<(), WeaveError> {
    for (index, line) in lines.iter().enumerate() {
        let body = line.strip_suffix(b"\n").unwrap_or(line);
        if body.contains(&b'\n') {
            return Err(WeaveError::NotALine {
                version: name.to_string(),
                index,
                line: String::from_utf8_lossy(line).into_owned(),
            });
        }
    }
    Ok(())
}

/// A line-based store of many revisions of one text.
///
/// Cloning a weave copies its content and shares its capabilities.
#[derive(Clone)]
pub struct Weave {
    /// Optional label used in log messages
    label: Option<String>,
    /// Parent indices of each version, as given, without duplicates
    parents: Vec<Vec<usize>>,
    /// Checksum of each version's fulltext
    checksums: Vec<Checksum>,
    /// Name of each version
    names: Vec<VersionName>,
    /// Inverse of `names`
    name_map: HashMap<VersionName, usize>,
    /// The shared instruction stream
    stream: Vec<Instruction>,
    hasher: Arc<dyn ContentHasher>,
    matcher: Arc<dyn SequenceMatcher>,
    name_policy: Arc<dyn NamePolicy>,
    allow_reserved: bool,
    access_mode: AccessMode,
    scope: Arc<dyn Scope>,
    /// Token captured from `scope` at construction
    scope_token: ScopeToken,
}

impl Default for Weave {
    fn default() -> Self {
        Self::new()
    }
}

impl Weave {
    /// Create an empty weave with default capabilities.
    ///
    /// The defaults are SHA-1 checksums, the patience matcher, the
    /// trailing-`:` reservation policy, write access and no scope.
    pub fn new() -> Self {
        Self {
            label: None,
            parents: Vec::new(),
            checksums: Vec::new(),
            names: Vec::new(),
            name_map: HashMap::new(),
            stream: Vec::new(),
            hasher: Arc::new(Sha1Hasher),
            matcher: Arc::new(PatienceMatcher),
            name_policy: Arc::new(ReservedSuffix::default()),
            allow_reserved: false,
            access_mode: AccessMode::Write,
            scope: Arc::new(Unscoped),
            scope_token: ScopeToken::DETACHED,
        }
    }

    /// Create an empty weave from configured options.
    pub fn with_options(options: WeaveOptions) -> Self {
        Self::new()
            .with_hasher(options.hash.hasher())
            .with_matcher(options.matcher.matcher())
            .allow_reserved(options.allow_reserved)
            .with_access_mode(options.access_mode)
    }

    /// Set the label used in log messages.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Use a different content hash.
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Use a different sequence matcher.
    pub fn with_matcher(mut self, matcher: Arc<dyn SequenceMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Use a different reserved-name policy.
    pub fn with_name_policy(mut self, policy: Arc<dyn NamePolicy>) -> Self {
        self.name_policy = policy;
        self
    }

    /// Allow looking up reserved names.
    pub fn allow_reserved(mut self, allow: bool) -> Self {
        self.allow_reserved = allow;
        self
    }

    /// Set the access mode.
    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = mode;
        self
    }

    /// Bind the weave to a transaction scope, capturing its current token.
    pub fn with_scope(mut self, scope: Arc<dyn Scope>) -> Self {
        self.scope_token = scope.current();
        self.scope = scope;
        self
    }

    /// The hash this weave checksums versions with.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    /// Label used in log messages.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }

    /// Number of versions.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the weave holds no versions.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Version names in index order.
    pub fn versions(&self) -> &[VersionName] {
        &self.names
    }

    /// Whether a version is present, reserved or not.
    pub fn has_version(&self, name: &str) -> bool {
        self.name_map.contains_key(name)
    }

    /// The shared instruction stream.
    pub fn instructions(&self) -> &[Instruction] {
        &self.stream
    }

    /// Index of a version.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::ReservedNameRejected`] for a reserved name, unless the
    ///   weave allows them
    /// - [`WeaveError::VersionNotPresent`] if the name is unknown
    pub fn lookup(&self, name: &str) -> Result<usize, WeaveError> {
        if !self.allow_reserved && self.name_policy.is_reserved(name) {
            return Err(WeaveError::ReservedNameRejected(name.to_string()));
        }
        self.name_map
            .get(name)
            .copied()
            .ok_or_else(|| WeaveError::VersionNotPresent(name.to_string()))
    }

    /// Name of the version at `index`.
    pub fn name_of(&self, index: usize) -> Result<&VersionName, WeaveError> {
        self.names
            .get(index)
            .ok_or_else(|| WeaveError::VersionNotPresent(index.to_string()))
    }

    /// Parent indices of the version at `index`.
    pub fn parent_indices(&self, index: usize) -> Result<&[usize], WeaveError> {
        self.parents
            .get(index)
            .map(Vec::as_slice)
            .ok_or_else(|| WeaveError::VersionNotPresent(index.to_string()))
    }

    /// Parent names of a version, in stored order.
    pub fn parent_names(&self, name: &str) -> Result<Vec<VersionName>, WeaveError> {
        let index = self.lookup(name)?;
        Ok(self.parents[index]
            .iter()
            .map(|&p| self.names[p].clone())
            .collect())
    }

    /// Stored checksum of a version.
    pub fn checksum(&self, name: &str) -> Result<&Checksum, WeaveError> {
        let index = self.lookup(name)?;
        Ok(&self.checksums[index])
    }

    /// Stored checksum of the version at `index`.
    pub fn checksum_at(&self, index: usize) -> Result<&Checksum, WeaveError> {
        self.checksums
            .get(index)
            .ok_or_else(|| WeaveError::VersionNotPresent(index.to_string()))
    }

    /// The reserved-name policy in use.
    pub fn name_policy(&self) -> &dyn NamePolicy {
        self.name_policy.as_ref()
    }

    fn check_write_ok(&self) -> Result<(), WeaveError> {
        if self.access_mode == AccessMode::ReadOnly {
            return Err(WeaveError::ReadOnly);
        }
        if self.scope.current() != self.scope_token {
            return Err(WeaveError::OutsideScope);
        }
        Ok(())
    }

    /// Add a version whose parents are given by name.
    ///
    /// Returns the index of the new version, or of the existing one if the
    /// same name was already added with the same parents and text.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::UnknownParent`] if a parent is absent
    /// - [`WeaveError::NotALine`] if a line has a `\n` before its last byte
    /// - [`WeaveError::DuplicateVersionConflict`] if the name exists with
    ///   other parents or text
    /// - [`WeaveError::OutsideScope`] or [`WeaveError::ReadOnly`]
    ///
    /// A failure after the new version's metadata was recorded leaves the
    /// weave inconsistent; discard it and reload.
    pub fn add(
        &mut self,
        name: &str,
        parents: &[&str],
        lines: &[Vec<u8>],
    ) -> Result<usize, WeaveError> {
        self.check_write_ok()?;
        let parents = parents
            .iter()
            .map(|p| match self.lookup(p) {
                Err(WeaveError::VersionNotPresent(p)) => Err(WeaveError::UnknownParent(p)),
                other => other,
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.add_with_parent_indices(name, &parents, lines)
    }

    /// Add a version whose parents are given by index.
    ///
    /// See [`Weave::add`].
    pub fn add_with_parent_indices(
        &mut self,
        name: &str,
        parents: &[usize],
        lines: &[Vec<u8>],
    ) -> Result<usize, WeaveError> {
        self.check_write_ok()?;
        let name = VersionName::new(name)?;
        check_lines_are_lines(&name, lines)?;
        let checksum = checksum_lines(self.hasher.as_ref(), lines);

        let mut unique: Vec<usize> = Vec::with_capacity(parents.len());
        for &p in parents {
            if p >= self.len() {
                return Err(WeaveError::UnknownParent(p.to_string()));
            }
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        let parents = unique;

        if let Some(&existing) = self.name_map.get(&name) {
            return self.check_repeated_add(existing, &parents, &checksum);
        }

        let new_version = self.len();
        self.parents.push(parents.clone());
        self.checksums.push(checksum.clone());
        self.names.push(name.clone());
        self.name_map.insert(name.clone(), new_version);

        if parents.is_empty() {
            if !lines.is_empty() {
                self.stream.push(Instruction::BeginInsert(new_version));
                self.stream
                    .extend(lines.iter().cloned().map(Instruction::Line));
                self.stream.push(Instruction::EndInsert);
            }
            debug!(weave = self.label(), version = %name, index = new_version, "added root version");
            return Ok(new_version);
        }

        if parents.len() == 1 && checksum == self.checksums[parents[0]] {
            debug!(weave = self.label(), version = %name, "text identical to its parent");
            return Ok(new_version);
        }

        let ancestors = self.inclusions(&parents);
        let (basis_positions, opcodes) = {
            let basis = extract(&self.stream, &ancestors)?;
            let basis_lines: Vec<&[u8]> = basis.iter().map(|l| l.line).collect();

            if basis_lines.len() == lines.len()
                && basis_lines.iter().zip(lines).all(|(a, b)| *a == b.as_slice())
            {
                debug!(weave = self.label(), version = %name, "text identical to merged basis");
                return Ok(new_version);
            }

            let new_lines: Vec<&[u8]> = lines.iter().map(Vec::as_slice).collect();
            let opcodes = self.matcher.opcodes(&basis_lines, &new_lines);

            let mut positions: Vec<usize> = basis.iter().map(|l| l.position).collect();
            // Sentinel so that appends anchor at the end of the stream
            positions.push(self.stream.len());
            (positions, opcodes)
        };

        // Number of instructions spliced in so far by this call
        let mut offset = 0;
        for op in opcodes {
            if op.tag == OpTag::Equal {
                continue;
            }
            let i1 = basis_positions[op.a_start];
            let i2 = basis_positions[op.a_end];

            if i1 != i2 {
                self.stream
                    .insert(i1 + offset, Instruction::BeginDelete(new_version));
                self.stream
                    .insert(i2 + offset + 1, Instruction::EndDelete(new_version));
                offset += 2;
            }

            if op.b_start != op.b_end {
                // After any deletion ending at i2
                let at = i2 + offset;
                let block = std::iter::once(Instruction::BeginInsert(new_version))
                    .chain(
                        lines[op.b_start..op.b_end]
                            .iter()
                            .cloned()
                            .map(Instruction::Line),
                    )
                    .chain(std::iter::once(Instruction::EndInsert));
                self.stream.splice(at..at, block);
                offset += 2 + (op.b_end - op.b_start);
            }
        }

        debug!(
            weave = self.label(),
            version = %name,
            index = new_version,
            spliced = offset,
            "added version against basis"
        );
        Ok(new_version)
    }

    fn check_repeated_add(
        &self,
        existing: usize,
        parents: &[usize],
        checksum: &Checksum,
    ) -> Result<usize, WeaveError> {
        let mut ours = self.parents[existing].clone();
        let mut theirs = parents.to_vec();
        ours.sort_unstable();
        theirs.sort_unstable();
        if ours != theirs || checksum != &self.checksums[existing] {
            return Err(WeaveError::DuplicateVersionConflict(
                self.names[existing].to_string(),
            ));
        }
        Ok(existing)
    }

    /// Indices of the given versions and all their ancestors.
    ///
    /// Unknown indices are ignored.
    pub fn inclusions(&self, versions: &[usize]) -> HashSet<usize> {
        let mut included: HashSet<usize> = versions
            .iter()
            .copied()
            .filter(|&v| v < self.len())
            .collect();
        let Some(&max) = included.iter().max() else {
            return included;
        };
        // Parents precede children, so one backward pass closes the set
        for v in (1..=max).rev() {
            if included.contains(&v) {
                included.extend(self.parents[v].iter().copied());
            }
        }
        included
    }

    /// Names of the given versions and all their ancestors.
    pub fn get_ancestry(&self, names: &[&str]) -> Result<BTreeSet<VersionName>, WeaveError> {
        let indices = names
            .iter()
            .map(|n| self.lookup(n))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .inclusions(&indices)
            .into_iter()
            .map(|i| self.names[i].clone())
            .collect())
    }

    /// Fulltext of a version, verified against its checksum.
    pub fn get(&self, name: &str) -> Result<Vec<Vec<u8>>, WeaveError> {
        let index = self.lookup(name)?;
        self.get_by_index(index)
    }

    /// Fulltext of the version at `index`, verified against its checksum.
    ///
    /// # Errors
    ///
    /// - [`WeaveError::VersionNotPresent`] for an out-of-range index
    /// - [`WeaveError::ChecksumMismatch`] if the text is corrupt
    /// - [`WeaveError::Format`] if the stream is malformed
    pub fn get_by_index(&self, index: usize) -> Result<Vec<Vec<u8>>, WeaveError> {
        if index >= self.len() {
            return Err(WeaveError::VersionNotPresent(index.to_string()));
        }
        let included = self.inclusions(&[index]);
        let lines: Vec<Vec<u8>> = extract(&self.stream, &included)?
            .into_iter()
            .map(|l| l.line.to_vec())
            .collect();

        let measured = checksum_lines(self.hasher.as_ref(), &lines);
        let expected = &self.checksums[index];
        if &measured != expected {
            warn!(
                weave = self.label(),
                version = %self.names[index],
                expected = %expected,
                measured = %measured,
                "checksum mismatch"
            );
            return Err(WeaveError::ChecksumMismatch {
                version: self.names[index].to_string(),
                expected: expected.clone(),
                measured,
            });
        }
        Ok(lines)
    }

    /// Each line of a version with the name of the version that introduced it.
    ///
    /// The text is not verified against its checksum.
    pub fn annotate(&self, name: &str) -> Result<Vec<(VersionName, Vec<u8>)>, WeaveError> {
        let index = self.lookup(name)?;
        let included = self.inclusions(&[index]);
        Ok(extract(&self.stream, &included)?
            .into_iter()
            .map(|l| (self.names[l.origin].clone(), l.line.to_vec()))
            .collect())
    }

    /// Every stream line inserted by one of the named versions, whether or
    /// not it is still present, with the inserting version.
    ///
    /// Lines missing a terminator are returned with one appended.
    pub fn lines_added_or_present(
        &self,
        names: &[&str],
    ) -> Result<Vec<(VersionName, Vec<u8>)>, WeaveError> {
        let wanted = names
            .iter()
            .map(|n| self.lookup(n))
            .collect::<Result<HashSet<_>, _>>()?;

        let mut result = Vec::new();
        for item in interpret::Walk::new(&self.stream) {
            let item = item?;
            if !wanted.contains(&item.inserted) {
                continue;
            }
            let mut line = item.line.to_vec();
            if !line.ends_with(b"\n") {
                line.push(b'\n');
            }
            result.push((self.names[item.inserted].clone(), line));
        }
        Ok(result)
    }

    /// Replace this weave's content with a copy of another's.
    ///
    /// Capabilities, scope and options are kept.
    pub(crate) fn copy_content_from(&mut self, other: &Weave) {
        self.parents = other.parents.clone();
        self.checksums = other.checksums.clone();
        self.names = other.names.clone();
        self.name_map = other.name_map.clone();
        self.stream = other.stream.clone();
    }

    /// An empty weave with this weave's capabilities and options.
    pub(crate) fn empty_like(&self) -> Weave {
        Weave {
            label: self.label.clone(),
            parents: Vec::new(),
            checksums: Vec::new(),
            names: Vec::new(),
            name_map: HashMap::new(),
            stream: Vec::new(),
            hasher: Arc::clone(&self.hasher),
            matcher: Arc::clone(&self.matcher),
            name_policy: Arc::clone(&self.name_policy),
            allow_reserved: self.allow_reserved,
            access_mode: AccessMode::Write,
            scope: Arc::new(Unscoped),
            scope_token: ScopeToken::DETACHED,
        }
    }
}

impl PartialEq for Weave {
    /// Weaves are equal when their content is; capabilities are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.parents == other.parents
            && self.checksums == other.checksums
            && self.names == other.names
            && self.stream == other.stream
    }
}

impl Eq for Weave {}

impl fmt::Debug for Weave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Weave")
            .field("label", &self.label)
            .field("versions", &self.names.len())
            .field("instructions", &self.stream.len())
            .field("hasher", &self.hasher)
            .field("matcher", &self.matcher)
            .field("access_mode", &self.access_mode)
            .field("scope_token", &self.scope_token)
            .finish()
    }
}
