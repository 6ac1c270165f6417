//! diff::patience
//!
//! Patience matcher: anchor on lines that occur exactly once on each side,
//! keep the longest run of anchors that is increasing on both sides, and
//! recurse into the gaps between them. Ranges without unique lines fall
//! back to [`super::lcs`].

use std::collections::HashMap;

use super::lcs::lcs_pairs;
use super::{blocks_from_pairs, MatchingBlock, SequenceMatcher};

/// Patience-diff line matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatienceMatcher;

impl SequenceMatcher for PatienceMatcher {
    fn matching_blocks(&self, a: &[&[u8]], b: &[&[u8]]) -> Vec<MatchingBlock> {
        let mut pairs = Vec::new();
        recurse(a, b, 0, a.len(), 0, b.len(), &mut pairs);
        blocks_from_pairs(&pairs)
    }
}

fn recurse(
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

    if alo < ahi && blo < bhi {
        let anchors = unique_lcs(a, b, alo, ahi, blo, bhi);
        if anchors.is_empty() {
            lcs_pairs(a, b, alo, ahi, blo, bhi, out);
        } else {
            let (mut last_a, mut last_b) = (alo, blo);
            for (i, j) in anchors {
                recurse(a, b, last_a, i, last_b, j, out);
                out.push((i, j));
                last_a = i + 1;
                last_b = j + 1;
            }
            recurse(a, b, last_a, ahi, last_b, bhi, out);
        }
    }

    for k in 0..suffix {
        out.push((ahi + k, bhi + k));
    }
}

/// Longest increasing run of lines unique to both ranges.
fn unique_lcs(
    a: &[&[u8]],
    b: &[&[u8]],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Vec<(usize, usize)> {
    // line -> (count in a, index in a, count in b, index in b)
    let mut seen: HashMap<&[u8], (usize, usize, usize, usize)> = HashMap::new();
    for (i, line) in a.iter().enumerate().take(ahi).skip(alo) {
        let entry = seen.entry(*line).or_insert((0, i, 0, 0));
        entry.0 += 1;
    }
    for (j, line) in b.iter().enumerate().take(bhi).skip(blo) {
        if let Some(entry) = seen.get_mut(line) {
            entry.2 += 1;
            entry.3 = j;
        }
    }

    let mut candidates: Vec<(usize, usize)> = seen
        .values()
        .filter(|(count_a, _, count_b, _)| *count_a == 1 && *count_b == 1)
        .map(|&(_, i, _, j)| (i, j))
        .collect();
    candidates.sort_unstable();

    longest_increasing(&candidates)
}

/// Longest subsequence of `pairs` (sorted by `.0`) increasing in `.1`.
fn longest_increasing(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    // tails[k]: index into pairs of the smallest tail of a run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut back: Vec<Option<usize>> = vec![None; pairs.len()];

    for (idx, &(_, j)) in pairs.iter().enumerate() {
        let slot = tails.partition_point(|&t| pairs[t].1 < j);
        back[idx] = if slot > 0 { Some(tails[slot - 1]) } else { None };
        if slot == tails.len() {
            tails.push(idx);
        } else {
            tails[slot] = idx;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(idx) = cursor {
        result.push(pairs[idx]);
        cursor = back[idx];
    }
    result.reverse();
    result
}
