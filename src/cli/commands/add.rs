//! add command - Add a version to a weave

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::with_locked;
use crate::cli::Context;
use crate::ui::output;
use crate::weave::split_lines;

/// Add a version whose text comes from `input` or stdin.
pub fn add(
    ctx: &Context,
    file: &Path,
    name: &str,
    parents: &[String],
    input: Option<&Path>,
) -> Result<()> {
    let text = match input {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let lines = split_lines(&text);
    let parents: Vec<&str> = parents.iter().map(String::as_str).collect();

    let index = with_locked(ctx, file, false, |weave| {
        weave
            .add(name, &parents, &lines)
            .with_context(|| format!("Failed to add version '{}'", name))
    })?;

    output::success(
        format!("Added {} as version {} ({} lines)", name, index, lines.len()),
        ctx.verbosity,
    );
    Ok(())
}
