//! plan-merge and merge commands - Three-way merge of two versions

use std::path::Path;

use anyhow::{bail, Result};

use super::{open_read, write_lines};
use crate::cli::Context;
use crate::ui::output;
use crate::weave::plan::{merge_lines, ConflictMarkers};
use crate::weave::MergeState;

/// Print every line with its merge state.
pub fn plan_merge(ctx: &Context, file: &Path, a: &str, b: &str) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let mut lines = Vec::new();
    for step in weave.plan_merge(a, b)? {
        let (state, line) = step?;
        let mut out = format!("{:>11} | ", state.as_str()).into_bytes();
        out.extend_from_slice(line);
        if !line.ends_with(b"\n") {
            out.push(b'\n');
        }
        lines.push(out);
    }
    write_lines(&lines)
}

/// Print the merged text; fails if it has conflicts.
pub fn merge(ctx: &Context, file: &Path, a: &str, b: &str) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let plan: Vec<(MergeState, &[u8])> = weave.plan_merge(a, b)?.collect::<Result<_, _>>()?;
    let outcome = merge_lines(&plan, &ConflictMarkers::default());
    write_lines(&outcome.lines)?;

    if outcome.conflicted {
        output::warn(
            format!("merge of {} and {} has conflicts", a, b),
            ctx.verbosity,
        );
        bail!("merge conflicts");
    }
    Ok(())
}
