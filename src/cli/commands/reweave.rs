//! reweave and join commands - Combine weaves

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{open_read, with_locked, WeavePath};
use crate::cli::Context;
use crate::core::ops::{LockScope, StoreLock};
use crate::transport::Transport;
use crate::ui::output;
use crate::weave::{format, reweave as combine};

/// Write the reweave of `a` and `b` to `out`, replacing it.
pub fn reweave(ctx: &Context, a: &Path, b: &Path, out: &Path) -> Result<()> {
    let first = open_read(ctx, a)?;
    let second = open_read(ctx, b)?;
    let combined = combine::reweave(&first, &second)
        .with_context(|| format!("Failed to reweave '{}' and '{}'", a.display(), b.display()))?;

    let target = WeavePath::resolve(ctx, out)?;
    let scope = LockScope::new();
    let _lock = StoreLock::acquire(&target.file(), &scope)?;
    target
        .transport()
        .put_bytes(&target.file_name(), &format::to_bytes(&combined))
        .with_context(|| format!("Failed to write '{}'", target.file().display()))?;

    output::success(
        format!(
            "Wrote {} versions to {}",
            combined.len(),
            target.file().display()
        ),
        ctx.verbosity,
    );
    Ok(())
}

/// Bring every version of `other` into `file`.
pub fn join(ctx: &Context, file: &Path, other: &Path) -> Result<()> {
    let source = open_read(ctx, other)?;
    let count = with_locked(ctx, file, false, |weave| {
        weave
            .join(&source)
            .with_context(|| format!("Failed to join '{}'", other.display()))?;
        Ok(weave.len())
    })?;
    output::success(format!("Weave now has {} versions", count), ctx.verbosity);
    Ok(())
}
