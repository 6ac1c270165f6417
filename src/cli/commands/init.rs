//! init command - Create an empty weave file

use std::path::Path;

use anyhow::{bail, Result};

use super::{with_locked, WeavePath};
use crate::cli::Context;
use crate::ui::output;

/// Create an empty weave file.
///
/// Fails if the file already exists.
pub fn init(ctx: &Context, file: &Path) -> Result<()> {
    let path = WeavePath::resolve(ctx, file)?;
    if path.file().exists() {
        bail!("'{}' already exists", path.file().display());
    }
    with_locked(ctx, file, true, |_| Ok(()))?;
    output::success(
        format!("Created empty weave {}", path.file().display()),
        ctx.verbosity,
    );
    Ok(())
}
