//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`VersionName`] - Validated name of one stored version
//! - [`Checksum`] - Hex digest of a version's fulltext
//!
//! # Validation
//!
//! These types enforce validity at construction time. A name that could not
//! be written into a weave file cannot be represented, so the serializer
//! never has to second-guess the engine.
//!
//! # Examples
//!
//! ```
//! use weavestore::core::types::{Checksum, VersionName};
//!
//! let name = VersionName::new("rev-1").unwrap();
//! let sum = Checksum::new("F572D396FAE9206628714FB2CE00F72E94F2258F").unwrap();
//! assert_eq!(sum.as_str(), "f572d396fae9206628714fb2ce00f72e94f2258f");
//!
//! assert!(VersionName::new("").is_err());
//! assert!(VersionName::new("two\nlines").is_err());
//! assert!(Checksum::new("not-hex").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version name: {0}")]
    InvalidVersionName(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),
}

/// A validated version name.
///
/// Version names are opaque to the weave, but they are stored one per
/// line in the weave file header, so:
/// - Cannot be empty
/// - Cannot contain `\n` or `\r`
///
/// Whether a name is *reserved* is a separate policy question, answered by
/// [`crate::core::naming::NamePolicy`] at lookup time.
///
/// # Example
///
/// ```
/// use weavestore::core::types::VersionName;
///
/// let name = VersionName::new("merge of a and b").unwrap();
/// assert_eq!(name.as_str(), "merge of a and b");
///
/// assert!(VersionName::new("").is_err());
/// assert!(VersionName::new("bad\rname").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionName(String);

impl VersionName {
    /// Create a new validated version name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersionName` if the name is empty or spans lines.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidVersionName(
                "version name cannot be empty".into(),
            ));
        }
        if name.contains('\n') || name.contains('\r') {
            return Err(TypeError::InvalidVersionName(format!(
                "version name cannot contain line breaks: {:?}",
                name
            )));
        }
        Ok(())
    }

    /// Get the version name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VersionName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for VersionName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<VersionName> for String {
    fn from(name: VersionName) -> Self {
        name.0
    }
}

impl AsRef<str> for VersionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for VersionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex digest of a version's fulltext.
///
/// Checksums are normalized to lowercase. Both SHA-1 (40 hex characters)
/// and SHA-256 (64 hex characters) digests are accepted.
///
/// # Example
///
/// ```
/// use weavestore::core::types::Checksum;
///
/// let sum = Checksum::new("90f265c6e75f1c8f9ab76dcf85528352c5f215ef").unwrap();
/// assert_eq!(sum.short(8), "90f265c6");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Create a new validated checksum.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidChecksum` if the string is not a hex digest
    /// of a supported length.
    pub fn new(hex: impl Into<String>) -> Result<Self, TypeError> {
        let hex = hex.into().to_ascii_lowercase();
        Self::validate(&hex)?;
        Ok(Self(hex))
    }

    /// Wrap raw digest bytes.
    pub(crate) fn from_digest(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    fn validate(hex: &str) -> Result<(), TypeError> {
        if hex.len() != 40 && hex.len() != 64 {
            return Err(TypeError::InvalidChecksum(format!(
                "expected 40 or 64 hex characters, got {}",
                hex.len()
            )));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidChecksum(
                "checksum must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get an abbreviated form of the checksum.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the checksum as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Checksum {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Checksum> for String {
    fn from(sum: Checksum) -> Self {
        sum.0
    }
}

impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod version_name {
        use super::*;

        #[test]
        fn accepts_ordinary_names() {
            for name in ["text0", "rev-1", "user@host-20050101", "with space", "a:b"] {
                assert!(VersionName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn rejects_empty() {
            assert!(matches!(
                VersionName::new(""),
                Err(TypeError::InvalidVersionName(_))
            ));
        }

        #[test]
        fn rejects_line_breaks() {
            assert!(VersionName::new("a\nb").is_err());
            assert!(VersionName::new("a\r").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let name = VersionName::new("text1").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, "\"text1\"");
            let parsed: VersionName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, name);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<VersionName, _> = serde_json::from_str("\"\"");
            assert!(result.is_err());
        }
    }

    mod checksum {
        use super::*;

        #[test]
        fn normalizes_to_lowercase() {
            let sum = Checksum::new("ABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
            assert_eq!(sum.as_str(), "abcdef0123456789abcdef0123456789abcdef01");
        }

        #[test]
        fn accepts_sha256_length() {
            let hex = "a".repeat(64);
            assert!(Checksum::new(hex).is_ok());
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(matches!(
                Checksum::new("abc"),
                Err(TypeError::InvalidChecksum(_))
            ));
        }

        #[test]
        fn rejects_non_hex() {
            let bad = "g".repeat(40);
            assert!(Checksum::new(bad).is_err());
        }

        #[test]
        fn from_digest_encodes_hex() {
            let sum = Checksum::from_digest(&[0xab; 20]);
            assert_eq!(sum.as_str(), "ab".repeat(20));
        }
    }
}
