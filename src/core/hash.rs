//! core::hash
//!
//! Content hashing for version fulltexts.
//!
//! A version's checksum is the digest of the concatenation of its lines,
//! terminators included. The hash function is a capability handed to the
//! weave; SHA-1 is the default because it is what the v5 file format has
//! always recorded.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::types::Checksum;

/// An in-progress digest over a sequence of lines.
pub trait LineDigest {
    /// Feed one line (with its terminator, if any).
    fn feed(&mut self, line: &[u8]);

    /// Finish and return the hex checksum.
    fn finish(self: Box<Self>) -> Checksum;
}

impl<D: Digest> LineDigest for D {
    fn feed(&mut self, line: &[u8]) {
        Digest::update(self, line);
    }

    fn finish(self: Box<Self>) -> Checksum {
        Checksum::from_digest(&(*self).finalize())
    }
}

/// A hash function used to checksum version texts.
pub trait ContentHasher: fmt::Debug + Send + Sync {
    /// Start a new digest.
    fn digest(&self) -> Box<dyn LineDigest>;

    /// Which algorithm this is, so stored checksums can be matched to it.
    fn algorithm(&self) -> HashAlgorithm;
}

/// Checksum a whole text with the given hasher.
///
/// # Example
///
/// ```
/// use weavestore::core::hash::{checksum_lines, Sha1Hasher};
///
/// let sum = checksum_lines(&Sha1Hasher, &[b"hello\n".as_slice()]);
/// assert_eq!(sum.as_str(), "f572d396fae9206628714fb2ce00f72e94f2258f");
/// ```
pub fn checksum_lines<L: AsRef<[u8]>>(hasher: &dyn ContentHasher, lines: &[L]) -> Checksum {
    let mut digest = hasher.digest();
    for line in lines {
        digest.feed(line.as_ref());
    }
    digest.finish()
}

/// SHA-1, the format's historical checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl ContentHasher for Sha1Hasher {
    fn digest(&self) -> Box<dyn LineDigest> {
        Box::new(Sha1::new())
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha1
    }
}

/// SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn digest(&self) -> Box<dyn LineDigest> {
        Box::new(Sha256::new())
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

/// Configurable choice of hash function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// All algorithm names accepted in configuration.
    pub const NAMES: [&'static str; 2] = ["sha1", "sha256"];

    /// Build the hasher for this algorithm.
    pub fn hasher(self) -> std::sync::Arc<dyn ContentHasher> {
        match self {
            HashAlgorithm::Sha1 => std::sync::Arc::new(Sha1Hasher),
            HashAlgorithm::Sha256 => std::sync::Arc::new(Sha256Hasher),
        }
    }

    /// The algorithm that produced `checksum`, judged by its length.
    pub fn of_checksum(checksum: &Checksum) -> Option<Self> {
        match checksum.as_str().len() {
            40 => Some(HashAlgorithm::Sha1),
            64 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(format!(
                "unknown hash '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "sha1"),
            HashAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}
