//! get and annotate commands - Print version text

use std::path::Path;

use anyhow::Result;

use super::{open_read, write_lines};
use crate::cli::Context;

/// Print the text of a version.
pub fn get(ctx: &Context, file: &Path, version: &str) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let lines = weave.get(version)?;
    write_lines(&lines)
}

/// Print every line of a version prefixed with the version that added it.
pub fn annotate(ctx: &Context, file: &Path, version: &str) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let annotated = weave.annotate(version)?;
    let width = annotated
        .iter()
        .map(|(origin, _)| origin.as_str().len())
        .max()
        .unwrap_or(0);

    let lines: Vec<Vec<u8>> = annotated
        .into_iter()
        .map(|(origin, line)| {
            let mut out = format!("{:<width$} | ", origin.as_str(), width = width).into_bytes();
            out.extend_from_slice(&line);
            out
        })
        .collect();
    write_lines(&lines)
}
