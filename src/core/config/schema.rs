//! core::config::schema
//!
//! Configuration schema types.
//!
//! The same schema is used for the global file and the project file; any
//! key left out falls through to the next lower layer.

use serde::{Deserialize, Serialize};

use crate::core::hash::HashAlgorithm;
use crate::diff::MatcherKind;

/// One configuration file.
///
/// # Example
///
/// ```toml
/// [store]
/// hash = "sha1"
/// matcher = "patience"
/// allow_reserved = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Weave store settings
    pub store: Option<StoreConfig>,
}

/// The `[store]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Hash used for version checksums
    pub hash: Option<HashAlgorithm>,

    /// Matcher used when adding versions
    pub matcher: Option<MatcherKind>,

    /// Whether reserved names may be looked up
    pub allow_reserved: Option<bool>,
}

impl ConfigFile {
    pub(crate) fn hash(&self) -> Option<HashAlgorithm> {
        self.store.as_ref().and_then(|s| s.hash)
    }

    pub(crate) fn matcher(&self) -> Option<MatcherKind> {
        self.store.as_ref().and_then(|s| s.matcher)
    }

    pub(crate) fn allow_reserved(&self) -> Option<bool> {
        self.store.as_ref().and_then(|s| s.allow_reserved)
    }
}
