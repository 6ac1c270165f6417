//! diff
//!
//! Pluggable line sequence matchers.
//!
//! # Overview
//!
//! The weave never diffs texts itself; it asks a [`SequenceMatcher`] for the
//! matching blocks between the basis view and the new text, and turns every
//! non-equal [`Opcode`] into insert/delete brackets in the stream.
//!
//! Two matchers ship with the crate:
//! - [`PatienceMatcher`] (default) anchors on lines unique to both sides
//! - [`LcsMatcher`] computes a plain longest common subsequence
//!
//! # Example
//!
//! ```
//! use weavestore::diff::{OpTag, PatienceMatcher, SequenceMatcher};
//!
//! let a = [b"a".as_slice(), b"b".as_slice(), b"c".as_slice()];
//! let b = [b"a".as_slice(), b"x".as_slice(), b"c".as_slice()];
//! let ops = PatienceMatcher.opcodes(&a, &b);
//! let tags: Vec<OpTag> = ops.iter().map(|op| op.tag).collect();
//! assert_eq!(tags, vec![OpTag::Equal, OpTag::Replace, OpTag::Equal]);
//! ```

mod lcs;
mod patience;

pub use lcs::LcsMatcher;
pub use patience::PatienceMatcher;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A run of `len` equal lines starting at `a_start` and `b_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Kind of edit described by an [`Opcode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// `a[a_start..a_end]` should be turned into `b[b_start..b_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

/// A longest-common-subsequence style line matcher.
pub trait SequenceMatcher: fmt::Debug + Send + Sync {
    /// Matching blocks between `a` and `b`, in increasing order on both
    /// sides, non-overlapping.
    fn matching_blocks(&self, a: &[&[u8]], b: &[&[u8]]) -> Vec<MatchingBlock>;

    /// Edit script turning `a` into `b`.
    fn opcodes(&self, a: &[&[u8]], b: &[&[u8]]) -> Vec<Opcode> {
        opcodes_from_blocks(&self.matching_blocks(a, b), a.len(), b.len())
    }
}

/// Coalesce matched index pairs into maximal blocks.
///
/// `pairs` must be strictly increasing on both coordinates.
pub(crate) fn blocks_from_pairs(pairs: &[(usize, usize)]) -> Vec<MatchingBlock> {
    let mut blocks: Vec<MatchingBlock> = Vec::new();
    for &(i, j) in pairs {
        match blocks.last_mut() {
            Some(last) if last.a_start + last.len == i && last.b_start + last.len == j => {
                last.len += 1;
            }
            _ => blocks.push(MatchingBlock {
                a_start: i,
                b_start: j,
                len: 1,
            }),
        }
    }
    blocks
}

/// Turn matching blocks into a complete edit script.
pub(crate) fn opcodes_from_blocks(
    blocks: &[MatchingBlock],
    a_len: usize,
    b_len: usize,
) -> Vec<Opcode> {
    let sentinel = MatchingBlock {
        a_start: a_len,
        b_start: b_len,
        len: 0,
    };

    let mut ops = Vec::new();
    let (mut i, mut j) = (0, 0);
    for block in blocks.iter().chain(std::iter::once(&sentinel)) {
        let tag = match (i < block.a_start, j < block.b_start) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            ops.push(Opcode {
                tag,
                a_start: i,
                a_end: block.a_start,
                b_start: j,
                b_end: block.b_start,
            });
        }
        i = block.a_start + block.len;
        j = block.b_start + block.len;
        if block.len > 0 {
            ops.push(Opcode {
                tag: OpTag::Equal,
                a_start: block.a_start,
                a_end: i,
                b_start: block.b_start,
                b_end: j,
            });
        }
    }
    ops
}

/// Configurable choice of matcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    #[default]
    Patience,
    Lcs,
}

impl MatcherKind {
    /// All matcher names accepted in configuration.
    pub const NAMES: [&'static str; 2] = ["patience", "lcs"];

    /// Build the matcher for this kind.
    pub fn matcher(self) -> Arc<dyn SequenceMatcher> {
        match self {
            MatcherKind::Patience => Arc::new(PatienceMatcher),
            MatcherKind::Lcs => Arc::new(LcsMatcher),
        }
    }
}

impl FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patience" => Ok(MatcherKind::Patience),
            "lcs" => Ok(MatcherKind::Lcs),
            other => Err(format!(
                "unknown matcher '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::Patience => write!(f, "patience"),
            MatcherKind::Lcs => write!(f, "lcs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_coalesce_into_blocks() {
        let blocks = blocks_from_pairs(&[(0, 0), (1, 1), (3, 2), (4, 3)]);
        assert_eq!(
            blocks,
            vec![
                MatchingBlock {
                    a_start: 0,
                    b_start: 0,
                    len: 2
                },
                MatchingBlock {
                    a_start: 3,
                    b_start: 2,
                    len: 2
                },
            ]
        );
    }

    #[test]
    fn opcodes_cover_both_sides() {
        let blocks = [MatchingBlock {
            a_start: 1,
            b_start: 2,
            len: 1,
        }];
        let ops = opcodes_from_blocks(&blocks, 3, 3);
        assert_eq!(
            ops,
            vec![
                Opcode {
                    tag: OpTag::Replace,
                    a_start: 0,
                    a_end: 1,
                    b_start: 0,
                    b_end: 2
                },
                Opcode {
                    tag: OpTag::Equal,
                    a_start: 1,
                    a_end: 2,
                    b_start: 2,
                    b_end: 3
                },
                Opcode {
                    tag: OpTag::Delete,
                    a_start: 2,
                    a_end: 3,
                    b_start: 3,
                    b_end: 3
                },
            ]
        );
    }

    #[test]
    fn opcodes_of_empty_inputs() {
        assert!(opcodes_from_blocks(&[], 0, 0).is_empty());
        let ops = opcodes_from_blocks(&[], 0, 2);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, OpTag::Insert);
    }

    #[test]
    fn matcher_kind_parses() {
        assert_eq!("lcs".parse::<MatcherKind>(), Ok(MatcherKind::Lcs));
        assert_eq!("patience".parse::<MatcherKind>(), Ok(MatcherKind::Patience));
        assert!("myers".parse::<MatcherKind>().is_err());
    }
}
