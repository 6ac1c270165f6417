//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the weave file argument to a directory and a weave name
//! 2. Opens the weave, under the store lock when it mutates
//! 3. Formats and displays output
//!
//! Weave file arguments must end in `.weave`. The file's directory becomes
//! the root of a [`LocalTransport`] and its stem the weave name.

mod add;
mod check;
mod completion;
mod init;
mod inspect;
mod merge;
mod reweave;
mod show;

pub use add::add;
pub use check::check;
pub use completion::completion;
pub use init::init;
pub use inspect::{ancestry, parents, stats, toc};
pub use merge::{merge, plan_merge};
pub use reweave::{join, reweave};
pub use show::{annotate, get};

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};

use super::args::Command;
use super::Context;
use crate::core::ops::{LockScope, StoreLock};
use crate::transport::LocalTransport;
use crate::weave::file::WEAVE_SUFFIX;
use crate::weave::WeaveFile;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { file } => init::init(ctx, &file),
        Command::Add {
            file,
            name,
            parents,
            input,
        } => add::add(ctx, &file, &name, &parents, input.as_deref()),
        Command::Get { file, version } => show::get(ctx, &file, &version),
        Command::Annotate { file, version } => show::annotate(ctx, &file, &version),
        Command::Check { file, json } => check::check(ctx, &file, json),
        Command::Toc { file, json } => inspect::toc(ctx, &file, json),
        Command::Stats { file } => inspect::stats(ctx, &file),
        Command::Ancestry { file, versions } => inspect::ancestry(ctx, &file, &versions),
        Command::Parents { file, version } => inspect::parents(ctx, &file, &version),
        Command::PlanMerge { file, a, b } => merge::plan_merge(ctx, &file, &a, &b),
        Command::Merge { file, a, b } => merge::merge(ctx, &file, &a, &b),
        Command::Reweave { a, b, out } => reweave::reweave(ctx, &a, &b, &out),
        Command::Join { file, other } => reweave::join(ctx, &file, &other),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// A weave file argument split into its directory and weave name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WeavePath {
    dir: PathBuf,
    name: String,
}

impl WeavePath {
    /// Resolve a `.weave` path against the context's directory.
    pub(crate) fn resolve(ctx: &Context, file: &Path) -> Result<Self> {
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            ctx.cwd()?.join(file)
        };
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid weave path '{}'", file.display()))?;
        let name = match file_name.strip_suffix(WEAVE_SUFFIX) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => bail!(
                "Weave path '{}' must end in '{}'",
                file.display(),
                WEAVE_SUFFIX
            ),
        };
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self { dir, name })
    }

    /// Full path of the weave file.
    pub(crate) fn file(&self) -> PathBuf {
        self.dir.join(self.file_name())
    }

    /// Transport path of the weave file, relative to its directory.
    fn file_name(&self) -> String {
        format!("{}{}", self.name, WEAVE_SUFFIX)
    }

    fn transport(&self) -> Arc<LocalTransport> {
        Arc::new(LocalTransport::new(&self.dir))
    }
}

/// Open a weave file for reading.
pub(crate) fn open_read(ctx: &Context, file: &Path) -> Result<WeaveFile> {
    let path = WeavePath::resolve(ctx, file)?;
    let options = ctx.weave_options(true)?;
    WeaveFile::open(&path.name, path.transport(), options, false)
        .with_context(|| format!("Failed to open '{}'", path.file().display()))
}

/// Run `f` on a weave file while holding its store lock.
pub(crate) fn with_locked<T>(
    ctx: &Context,
    file: &Path,
    create: bool,
    f: impl FnOnce(&mut WeaveFile) -> Result<T>,
) -> Result<T> {
    let path = WeavePath::resolve(ctx, file)?;
    let options = ctx.weave_options(false)?;
    let scope = LockScope::new();
    let lock = StoreLock::acquire(&path.file(), &scope)?;

    let mut weave = WeaveFile::open_scoped(
        &path.name,
        path.transport(),
        options,
        create,
        Some(scope.as_scope()),
    )
    .with_context(|| format!("Failed to open '{}'", path.file().display()))?;
    let result = f(&mut weave);
    drop(lock);
    result
}

/// Write raw lines to stdout.
pub(crate) fn write_lines<L: AsRef<[u8]>>(lines: &[L]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        out.write_all(line.as_ref())?;
    }
    out.flush()?;
    Ok(())
}
