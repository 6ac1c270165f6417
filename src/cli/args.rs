//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--hash`, `--matcher`, `--allow-reserved`: Override configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::hash::HashAlgorithm;
use crate::diff::MatcherKind;

/// weave - Store, annotate and merge revisions of a text file
#[derive(Parser, Debug)]
#[command(name = "weave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if weave was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Hash for new checksums (sha1, sha256)
    #[arg(long, global = true, value_name = "HASH")]
    pub hash: Option<HashAlgorithm>,

    /// Matcher for new versions (patience, lcs)
    #[arg(long, global = true, value_name = "MATCHER")]
    pub matcher: Option<MatcherKind>,

    /// Allow looking up reserved version names
    #[arg(long, global = true)]
    pub allow_reserved: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty weave file
    #[command(
        name = "init",
        after_help = "\
EXAMPLES:
    weave init notes.weave"
    )]
    Init {
        /// Weave file to create (must end in .weave)
        file: PathBuf,
    },

    /// Add a version read from stdin or a file
    #[command(
        name = "add",
        long_about = "Add a new version to the weave.\n\n\
            The text is read from --input or from stdin. Parents are named with \
            repeated --parent flags. Adding a version again with the same parents \
            and the same text is a no-op.",
        after_help = "\
EXAMPLES:
    # First version
    weave add notes.weave v1 --input notes.txt

    # Derived version
    weave add notes.weave v2 --parent v1 < notes.txt

    # Merge of two versions
    weave add notes.weave v3 --parent v2 --parent side --input merged.txt"
    )]
    Add {
        /// Weave file
        file: PathBuf,

        /// Name of the new version
        name: String,

        /// Parent version (repeatable)
        #[arg(short, long = "parent", value_name = "VERSION")]
        parents: Vec<String>,

        /// Read the text from this file instead of stdin
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,
    },

    /// Print the text of a version
    #[command(name = "get")]
    Get {
        /// Weave file
        file: PathBuf,

        /// Version name
        version: String,
    },

    /// Print a version with the origin of every line
    #[command(name = "annotate")]
    Annotate {
        /// Weave file
        file: PathBuf,

        /// Version name
        version: String,
    },

    /// Verify the structure and checksums of a weave
    #[command(
        name = "check",
        long_about = "Verify the weave.\n\n\
            Checks that parents precede their children, that computed ancestry \
            matches the parent links, and that every version's text hashes to its \
            stored checksum. Exits non-zero when any check fails."
    )]
    Check {
        /// Weave file
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List versions with their parents and checksums
    #[command(name = "toc")]
    Toc {
        /// Weave file
        file: PathBuf,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show size statistics for a weave
    #[command(name = "stats")]
    Stats {
        /// Weave file
        file: PathBuf,
    },

    /// List the ancestry of one or more versions
    #[command(name = "ancestry")]
    Ancestry {
        /// Weave file
        file: PathBuf,

        /// Version names
        #[arg(required = true)]
        versions: Vec<String>,
    },

    /// List the direct parents of a version
    #[command(name = "parents")]
    Parents {
        /// Weave file
        file: PathBuf,

        /// Version name
        version: String,
    },

    /// Show how every line relates to two versions
    #[command(
        name = "plan-merge",
        after_help = "\
STATES:
    unchanged, killed-a, killed-b, killed-both, killed-base,
    new-a, new-b, ghost-a, ghost-b, irrelevant"
    )]
    PlanMerge {
        /// Weave file
        file: PathBuf,

        /// First version
        a: String,

        /// Second version
        b: String,
    },

    /// Merge two versions and print the result
    #[command(
        name = "merge",
        long_about = "Three-way merge of two versions against their common ancestry.\n\n\
            Conflicting regions are wrapped in <<<<<<< / ======= / >>>>>>> markers. \
            Exits non-zero when the merge has conflicts."
    )]
    Merge {
        /// Weave file
        file: PathBuf,

        /// First version
        a: String,

        /// Second version
        b: String,
    },

    /// Combine two weaves into a new weave file
    #[command(
        name = "reweave",
        after_help = "\
EXAMPLES:
    weave reweave mine.weave theirs.weave combined.weave"
    )]
    Reweave {
        /// First input weave
        a: PathBuf,

        /// Second input weave
        b: PathBuf,

        /// Output weave file (overwritten)
        out: PathBuf,
    },

    /// Bring the versions of another weave into this one
    #[command(name = "join")]
    Join {
        /// Weave file to update
        file: PathBuf,

        /// Weave file to take versions from
        other: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
INSTALLATION:
    # Bash
    weave completion bash > ~/.local/share/bash-completion/completions/weave

    # Zsh
    weave completion zsh > ~/.zfunc/_weave

    # Fish
    weave completion fish > ~/.config/fish/completions/weave.fish

    # PowerShell
    weave completion power-shell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
