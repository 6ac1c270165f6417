//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (applied by the caller through [`Overrides`])
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$WEAVE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/weave/config.toml`
//! 3. `~/.weave/config.toml`
//!
//! # Project Config Location
//!
//! `.weave/config.toml` under the project directory.
//!
//! # Example
//!
//! ```no_run
//! use weavestore::core::config::{Config, Overrides};
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let options = config.weave_options(&Overrides::default());
//! println!("hash: {}", options.hash);
//! ```

pub mod schema;

pub use schema::{ConfigFile, StoreConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::hash::HashAlgorithm;
use crate::diff::MatcherKind;
use crate::weave::{AccessMode, WeaveOptions};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "WEAVE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub hash: Option<HashAlgorithm>,
    pub matcher: Option<MatcherKind>,
    pub allow_reserved: Option<bool>,
    pub read_only: bool,
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Project configuration (if found)
    pub project: Option<ConfigFile>,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// If `project_dir` is provided, also loads its `.weave/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(Self::discover_global().as_deref(), project_dir)
    }

    /// Load configuration from an explicit global file and project directory.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let (global, global_path) = match global_path.filter(|p| p.exists()) {
            Some(path) => (Self::read_config(path)?, Some(path.to_path_buf())),
            None => (ConfigFile::default(), None),
        };

        let (project, project_path) = match project_dir
            .map(Self::project_config_path)
            .filter(|p| p.exists())
        {
            Some(path) => (Some(Self::read_config(&path)?), Some(path)),
            None => (None, None),
        };

        debug!(
            global = ?global_path,
            project = ?project_path,
            "loaded configuration"
        );
        Ok(Config {
            global,
            project,
            global_path,
            project_path,
        })
    }

    /// Find the global config file, if any.
    fn discover_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("weave/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".weave/config.toml"))
            .filter(|p| p.exists())
    }

    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the project config under `project_dir`.
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".weave/config.toml")
    }

    /// Hash algorithm, defaulting to SHA-1.
    pub fn hash(&self) -> HashAlgorithm {
        self.layered(ConfigFile::hash).unwrap_or_default()
    }

    /// Matcher, defaulting to patience.
    pub fn matcher(&self) -> MatcherKind {
        self.layered(ConfigFile::matcher).unwrap_or_default()
    }

    /// Whether reserved names may be looked up, defaulting to `false`.
    pub fn allow_reserved(&self) -> bool {
        self.layered(ConfigFile::allow_reserved).unwrap_or(false)
    }

    /// Options for opening a weave, with CLI overrides applied last.
    pub fn weave_options(&self, overrides: &Overrides) -> WeaveOptions {
        WeaveOptions {
            hash: overrides.hash.unwrap_or_else(|| self.hash()),
            matcher: overrides.matcher.unwrap_or_else(|| self.matcher()),
            allow_reserved: overrides
                .allow_reserved
                .unwrap_or_else(|| self.allow_reserved()),
            access_mode: if overrides.read_only {
                AccessMode::ReadOnly
            } else {
                AccessMode::Write
            },
        }
    }

    /// Path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    fn layered<T>(&self, get: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.project
            .as_ref()
            .and_then(&get)
            .or_else(|| get(&self.global))
    }
}
