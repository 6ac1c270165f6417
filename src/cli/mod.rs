//! cli
//!
//! Command-line interface for the `weave` binary.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Resolve configuration and dispatch to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers open weave files through
//! [`crate::weave::WeaveFile`] on a [`crate::transport::LocalTransport`] and
//! take the [`crate::core::ops::StoreLock`] before any mutation.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::core::config::{Config, Overrides};
use crate::ui::output::Verbosity;
use crate::weave::WeaveOptions;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "WEAVE_LOG";

/// Settings shared by every command handler.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory to run in, if not the current one
    pub cwd: Option<PathBuf>,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// Values given on the command line
    pub overrides: Overrides,
}

impl Context {
    /// Build the context from parsed flags.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            cwd: cli.cwd.clone(),
            verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
            overrides: Overrides {
                hash: cli.hash,
                matcher: cli.matcher,
                allow_reserved: cli.allow_reserved.then_some(true),
                read_only: false,
            },
        }
    }

    /// The directory commands run in.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Options for opening weaves, with configuration and flags applied.
    pub fn weave_options(&self, read_only: bool) -> Result<WeaveOptions> {
        let cwd = self.cwd()?;
        let config = Config::load(Some(&cwd)).context("Failed to load configuration")?;
        let overrides = Overrides {
            read_only,
            ..self.overrides
        };
        Ok(config.weave_options(&overrides))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let ctx = Context::from_cli(&cli);
    commands::dispatch(cli.command, &ctx)
}

/// Install a stderr log subscriber filtered by `WEAVE_LOG`.
///
/// Without the variable, `--debug` selects debug level and warnings are
/// shown otherwise.
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
