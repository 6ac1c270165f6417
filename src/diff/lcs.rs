//! diff::lcs
//!
//! Plain longest-common-subsequence matcher.

use super::{blocks_from_pairs, MatchingBlock, SequenceMatcher};

/// Dynamic-programming LCS over whole lines.
///
/// Common prefix and suffix are matched directly so the quadratic table only
/// covers the changed middle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsMatcher;

impl SequenceMatcher for LcsMatcher {
    fn matching_blocks(&self, a: &[&[u8]], b: &[&[u8]]) -> Vec<MatchingBlock> {
        let mut pairs = Vec::new();
        lcs_pairs(a, b, 0, a.len(), 0, b.len(), &mut pairs);
        blocks_from_pairs(&pairs)
    }
}

/// Append matched `(i, j)` pairs for `a[alo..ahi]` against `b[blo..bhi]`.
pub(crate) fn lcs_pairs(
    a: &[&[u8]],
    b: &[&[u8]],
    mut alo: usize,
    mut ahi: usize,
    mut blo: usize,
    mut bhi: usize,
    out: &mut Vec<(usize, usize)>,
) {
    while alo < ahi && blo < bhi && a[alo] == b[blo] {
        out.push((alo, blo));
        alo += 1;
        blo += 1;
    }

    let mut suffix = 0;
    while alo < ahi && blo < bhi && a[ahi - 1] == b[bhi - 1] {
        ahi -= 1;
        bhi -= 1;
        suffix += 1;
    }

    let old = &a[alo..ahi];
    let new = &b[blo..bhi];
    let table = lcs_table(old, new);

    // Backtrack from the end, collecting matches in reverse
    let mut middle = Vec::new();
    let (mut i, mut j) = (old.len(), new.len());
    while i > 0 && j > 0 {
        if old[i - 1] == new[j - 1] {
            middle.push((alo + i - 1, blo + j - 1));
            i -= 1;
            j -= 1;
        } else if table[i - 1][j] >= table[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    out.extend(middle.into_iter().rev());

    for k in 0..suffix {
        out.push((ahi + k, bhi + k));
    }
}

/// Compute the longest common subsequence table for two slices of lines.
fn lcs_table(old: &[&[u8]], new: &[&[u8]]) -> Vec<Vec<usize>> {
    let m = old.len();
    let n = new.len();
    let mut table = vec![vec![0usize; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            if old[i - 1] == new[j - 1] {
                table[i][j] = table[i - 1][j - 1] + 1;
            } else {
                table[i][j] = table[i - 1][j].max(table[i][j - 1]);
            }
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::OpTag;

    fn lines(text: &'static str) -> Vec<&'static [u8]> {
        text.split(' ')
            .filter(|s| !s.is_empty())
            .map(str::as_bytes)
            .collect()
    }

    #[test]
    fn identical_inputs_are_one_block() {
        let a = lines("a b c");
        let blocks = LcsMatcher.matching_blocks(&a, &a);
        assert_eq!(
            blocks,
            vec![MatchingBlock {
                a_start: 0,
                b_start: 0,
                len: 3
            }]
        );
    }

    #[test]
    fn finds_longest_subsequence() {
        let a = lines("a b c d e");
        let b = lines("b x d e y");
        let mut pairs = Vec::new();
        lcs_pairs(&a, &b, 0, a.len(), 0, b.len(), &mut pairs);
        assert_eq!(pairs, vec![(1, 0), (3, 2), (4, 3)]);
    }

    #[test]
    fn disjoint_inputs_are_a_replace() {
        let a = lines("a b");
        let b = lines("c d e");
        let ops = LcsMatcher.opcodes(&a, &b);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, OpTag::Replace);
        assert_eq!((ops[0].a_start, ops[0].a_end), (0, 2));
        assert_eq!((ops[0].b_start, ops[0].b_end), (0, 3));
    }

    #[test]
    fn empty_sides() {
        let a = lines("a b");
        let empty: Vec<&[u8]> = Vec::new();
        let ops = LcsMatcher.opcodes(&a, &empty);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, OpTag::Delete);

        let ops = LcsMatcher.opcodes(&empty, &a);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, OpTag::Insert);
    }
}
