//! toc, stats, ancestry and parents commands - Read-only weave inspection

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::{open_read, WeavePath};
use crate::cli::Context;
use crate::ui::output;
use crate::weave::Weave;

/// One row of the table of contents.
#[derive(Debug, Serialize)]
struct TocEntry<'a> {
    index: usize,
    name: &'a str,
    parents: Vec<&'a str>,
    checksum: &'a str,
}

fn toc_entries(weave: &Weave) -> Result<Vec<TocEntry<'_>>> {
    let mut entries = Vec::with_capacity(weave.len());
    for (index, name) in weave.versions().iter().enumerate() {
        let parents = weave
            .parent_indices(index)?
            .iter()
            .map(|&p| weave.name_of(p).map(|n| n.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.push(TocEntry {
            index,
            name: name.as_str(),
            parents,
            checksum: weave.checksum_at(index)?.as_str(),
        });
    }
    Ok(entries)
}

/// Show the weave's table of contents.
pub fn toc(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let entries = toc_entries(&weave)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:>6} {:<30} {:<10} parents", "ver", "name", "checksum");
    for entry in &entries {
        let checksum: String = entry.checksum.chars().take(10).collect();
        println!(
            "{:>6} {:<30} {:<10} {}",
            entry.index,
            entry.name,
            checksum,
            entry.parents.join(" ")
        );
    }
    Ok(())
}

/// Size figures for one weave.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeaveStats {
    pub versions: usize,
    pub instructions: usize,
    pub file_bytes: u64,
    pub total_bytes: u64,
}

impl WeaveStats {
    /// Measure `weave`, stored in a file of `file_bytes` bytes.
    pub(crate) fn measure(weave: &Weave, file_bytes: u64) -> Result<Self> {
        let mut total_bytes = 0u64;
        for index in 0..weave.len() {
            total_bytes += weave
                .get_by_index(index)?
                .iter()
                .map(|line| line.len() as u64)
                .sum::<u64>();
        }
        Ok(Self {
            versions: weave.len(),
            instructions: weave.instructions().len(),
            file_bytes,
            total_bytes,
        })
    }

    /// Fulltext bytes per stored byte.
    pub(crate) fn compression_ratio(&self) -> f64 {
        if self.file_bytes == 0 {
            return 0.0;
        }
        self.total_bytes as f64 / self.file_bytes as f64
    }

    /// Average fulltext size, if there are versions.
    pub(crate) fn average_size(&self) -> Option<u64> {
        (self.versions > 0).then(|| self.total_bytes / self.versions as u64)
    }
}

/// Print size statistics.
pub fn stats(ctx: &Context, file: &Path) -> Result<()> {
    let path = WeavePath::resolve(ctx, file)?;
    let weave = open_read(ctx, file)?;
    let file_bytes = std::fs::metadata(path.file())
        .with_context(|| format!("Failed to stat '{}'", path.file().display()))?
        .len();
    let stats = WeaveStats::measure(&weave, file_bytes)?;

    println!("versions          {:>9}", stats.versions);
    println!("instructions      {:>9}", stats.instructions);
    println!("weave file        {:>9} bytes", stats.file_bytes);
    println!("total contents    {:>9} bytes", stats.total_bytes);
    println!("compression ratio {:>9.2}x", stats.compression_ratio());
    if let Some(avg) = stats.average_size().filter(|&avg| avg > 0) {
        println!("average size      {:>9} bytes", avg);
        println!(
            "relative size     {:>9.2}x",
            stats.file_bytes as f64 / avg as f64
        );
    }
    Ok(())
}

/// List every version in the ancestry of `versions`.
pub fn ancestry(ctx: &Context, file: &Path, versions: &[String]) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let names: Vec<&str> = versions.iter().map(String::as_str).collect();
    let ancestry = weave.get_ancestry(&names)?;
    let listed: Vec<&str> = ancestry.iter().map(|v| v.as_str()).collect();
    if !listed.is_empty() {
        println!("{}", output::format_list(&listed, ""));
    }
    Ok(())
}

/// List the direct parents of a version.
pub fn parents(ctx: &Context, file: &Path, version: &str) -> Result<()> {
    let weave = open_read(ctx, file)?;
    let parents = weave.parent_names(version)?;
    if !parents.is_empty() {
        println!("{}", output::format_list(&parents, ""));
    }
    Ok(())
}
