//! core::naming
//!
//! Reserved version names.
//!
//! # Features
//!
//! - Decide whether a version name is reserved for internal use
//! - Pluggable policy, consulted on lookup rather than on write
//!
//! Names ending in `:` are reserved by the default policy. Plain weaves
//! still accept them on `add` (callers such as the persistent wrapper
//! decide whether to check at write time); looking one up is rejected unless
//! the weave was built with `allow_reserved`.

use std::fmt;

/// Policy hook deciding which version names are reserved.
pub trait NamePolicy: fmt::Debug + Send + Sync {
    /// Returns true if `name` must not be used by ordinary callers.
    fn is_reserved(&self, name: &str) -> bool;
}

/// The default policy: a trailing `:` marks a reserved name.
///
/// # Example
///
/// ```
/// use weavestore::core::naming::{NamePolicy, ReservedSuffix};
///
/// let policy = ReservedSuffix::default();
/// assert!(policy.is_reserved("current:"));
/// assert!(!policy.is_reserved("rev-1"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedSuffix {
    suffix: char,
}

impl ReservedSuffix {
    /// Create a policy reserving names that end in `suffix`.
    pub fn new(suffix: char) -> Self {
        Self { suffix }
    }
}

impl Default for ReservedSuffix {
    fn default() -> Self {
        Self::new(':')
    }
}

impl NamePolicy for ReservedSuffix {
    fn is_reserved(&self, name: &str) -> bool {
        name.ends_with(self.suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_colon_is_reserved() {
        let policy = ReservedSuffix::default();
        assert!(policy.is_reserved("name:"));
        assert!(policy.is_reserved(":"));
    }

    #[test]
    fn interior_colon_is_not_reserved() {
        let policy = ReservedSuffix::default();
        assert!(!policy.is_reserved("a:b"));
        assert!(!policy.is_reserved("sha1:abc"));
    }

    #[test]
    fn custom_suffix() {
        let policy = ReservedSuffix::new('!');
        assert!(policy.is_reserved("wip!"));
        assert!(!policy.is_reserved("wip:"));
    }
}
