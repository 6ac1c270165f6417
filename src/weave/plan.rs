//! weave::plan
//!
//! Three-way merge planning.
//!
//! # Overview
//!
//! [`Weave::plan_merge`] classifies every line of the stream in one walk,
//! relative to two versions and their common ancestry. Unlike diffing two
//! extracted texts, the plan still knows which lines came from the common
//! base and who deleted them.
//!
//! [`merge_lines`] renders a plan as merged text with conflict markers, and
//! [`base_from_plan`] recovers the common base text.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use super::error::WeaveError;
use super::interpret::Walk;
use super::Weave;

/// Classification of one stream line in a merge plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeState {
    /// Present in the base and in both sides
    Unchanged,
    /// Added by a, not in b
    NewA,
    /// Added by b, not in a
    NewB,
    /// In the base, deleted by a
    KilledA,
    /// In the base, deleted by b
    KilledB,
    /// In the base, deleted by both sides
    KilledBoth,
    /// Deleted by a common ancestor
    KilledBase,
    /// Added and deleted again within a's ancestry
    GhostA,
    /// Added and deleted again within b's ancestry
    GhostB,
    /// Not in the ancestry of either side
    Irrelevant,
}

impl MergeState {
    /// All states in declaration order.
    pub const ALL: [MergeState; 10] = [
        MergeState::Unchanged,
        MergeState::NewA,
        MergeState::NewB,
        MergeState::KilledA,
        MergeState::KilledB,
        MergeState::KilledBoth,
        MergeState::KilledBase,
        MergeState::GhostA,
        MergeState::GhostB,
        MergeState::Irrelevant,
    ];

    /// The state's display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeState::Unchanged => "unchanged",
            MergeState::NewA => "new-a",
            MergeState::NewB => "new-b",
            MergeState::KilledA => "killed-a",
            MergeState::KilledB => "killed-b",
            MergeState::KilledBoth => "killed-both",
            MergeState::KilledBase => "killed-base",
            MergeState::GhostA => "ghost-a",
            MergeState::GhostB => "ghost-b",
            MergeState::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown merge state '{}'", s))
    }
}

/// Lazy merge plan over a weave's stream.
///
/// Yields `Err` once and stops if the stream is malformed.
#[derive(Debug)]
pub struct PlanMerge<'a> {
    walk: Walk<'a>,
    inc_a: HashSet<usize>,
    inc_b: HashSet<usize>,
    inc_c: HashSet<usize>,
}

impl<'a> Iterator for PlanMerge<'a> {
    type Item = Result<(MergeState, &'a [u8]), WeaveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.walk.next()? {
            Ok(item) => item,
            Err(err) => return Some(Err(err)),
        };
        let deleted_in = |set: &HashSet<usize>| item.deleted.iter().any(|d| set.contains(d));

        let state = if deleted_in(&self.inc_c) {
            MergeState::KilledBase
        } else if self.inc_c.contains(&item.inserted) {
            match (deleted_in(&self.inc_a), deleted_in(&self.inc_b)) {
                (true, true) => MergeState::KilledBoth,
                (true, false) => MergeState::KilledA,
                (false, true) => MergeState::KilledB,
                (false, false) => MergeState::Unchanged,
            }
        } else if self.inc_a.contains(&item.inserted) {
            if deleted_in(&self.inc_a) {
                MergeState::GhostA
            } else {
                MergeState::NewA
            }
        } else if self.inc_b.contains(&item.inserted) {
            if deleted_in(&self.inc_b) {
                MergeState::GhostB
            } else {
                MergeState::NewB
            }
        } else {
            MergeState::Irrelevant
        };
        Some(Ok((state, item.line)))
    }
}

impl Weave {
    /// Plan a three-way merge of two versions.
    ///
    /// # Example
    ///
    /// ```
    /// use weavestore::weave::{MergeState, Weave};
    ///
    /// let mut weave = Weave::new();
    /// weave.add("base", &[], &[b"x\n".to_vec()]).unwrap();
    /// weave.add("a", &["base"], &[b"x\n".to_vec(), b"a\n".to_vec()]).unwrap();
    /// weave.add("b", &["base"], &[]).unwrap();
    ///
    /// let plan: Vec<_> = weave
    ///     .plan_merge("a", "b")
    ///     .unwrap()
    ///     .collect::<Result<_, _>>()
    ///     .unwrap();
    /// assert_eq!(plan[0], (MergeState::KilledB, &b"x\n"[..]));
    /// assert_eq!(plan[1], (MergeState::NewA, &b"a\n"[..]));
    /// ```
    pub fn plan_merge(&self, a: &str, b: &str) -> Result<PlanMerge<'_>, WeaveError> {
        let a = self.lookup(a)?;
        let b = self.lookup(b)?;
        let inc_a = self.inclusions(&[a]);
        let inc_b = self.inclusions(&[b]);
        let inc_c: HashSet<usize> = inc_a.intersection(&inc_b).copied().collect();
        debug!(
            weave = self.label(),
            a = %self.names[a],
            b = %self.names[b],
            common = inc_c.len(),
            "planning merge"
        );
        Ok(PlanMerge {
            walk: Walk::new(&self.stream),
            inc_a,
            inc_b,
            inc_c,
        })
    }
}

/// Markers written around conflicting regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictMarkers {
    pub start: Vec<u8>,
    pub split: Vec<u8>,
    pub end: Vec<u8>,
}

impl Default for ConflictMarkers {
    fn default() -> Self {
        Self {
            start: b"<<<<<<< \n".to_vec(),
            split: b"=======\n".to_vec(),
            end: b">>>>>>> \n".to_vec(),
        }
    }
}

/// Merged text produced from a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub lines: Vec<Vec<u8>>,
    /// Whether any conflict region was emitted
    pub conflicted: bool,
}

/// Render a merge plan as text.
///
/// Unchanged lines resynchronise both sides. Between them, a region changed
/// by one side only takes that side's lines; a region changed by both is
/// emitted once if both agree and as a conflict otherwise.
pub fn merge_lines<L: AsRef<[u8]>>(
    plan: &[(MergeState, L)],
    markers: &ConflictMarkers,
) -> MergeOutcome {
    let mut out = MergeOutcome {
        lines: Vec::new(),
        conflicted: false,
    };
    let mut region = Region::default();

    for (state, line) in plan {
        let line = line.as_ref();
        match state {
            MergeState::Unchanged => {
                region.flush(&mut out, markers);
                out.lines.push(line.to_vec());
            }
            MergeState::KilledA => {
                region.changed_a = true;
                region.lines_b.push(line.to_vec());
            }
            MergeState::KilledB => {
                region.changed_b = true;
                region.lines_a.push(line.to_vec());
            }
            MergeState::NewA => {
                region.changed_a = true;
                region.lines_a.push(line.to_vec());
            }
            MergeState::NewB => {
                region.changed_b = true;
                region.lines_b.push(line.to_vec());
            }
            // A change even though no line survives
            MergeState::KilledBoth => {
                region.changed_a = true;
                region.changed_b = true;
            }
            MergeState::KilledBase
            | MergeState::GhostA
            | MergeState::GhostB
            | MergeState::Irrelevant => {}
        }
    }
    region.flush(&mut out, markers);
    out
}

/// Lines queued since the last unchanged line.
#[derive(Default)]
struct Region {
    lines_a: Vec<Vec<u8>>,
    lines_b: Vec<Vec<u8>>,
    changed_a: bool,
    changed_b: bool,
}

impl Region {
    fn flush(&mut self, out: &mut MergeOutcome, markers: &ConflictMarkers) {
        let region = std::mem::take(self);
        if region.lines_a.is_empty() && region.lines_b.is_empty() {
            return;
        }
        if region.changed_a && !region.changed_b {
            out.lines.extend(region.lines_a);
        } else if region.changed_b && !region.changed_a {
            out.lines.extend(region.lines_b);
        } else if region.lines_a == region.lines_b {
            out.lines.extend(region.lines_a);
        } else {
            out.conflicted = true;
            out.lines.push(markers.start.clone());
            out.lines.extend(region.lines_a);
            out.lines.push(markers.split.clone());
            out.lines.extend(region.lines_b);
            out.lines.push(markers.end.clone());
        }
    }
}

/// The common base text implied by a plan.
///
/// A line was in the base if it is unchanged or was deleted by either side.
pub fn base_from_plan<L: AsRef<[u8]>>(plan: &[(MergeState, L)]) -> Vec<Vec<u8>> {
    plan.iter()
        .filter(|(state, _)| {
            matches!(
                state,
                MergeState::Unchanged
                    | MergeState::KilledA
                    | MergeState::KilledB
                    | MergeState::KilledBoth
            )
        })
        .map(|(_, line)| line.as_ref().to_vec())
        .collect()
}
