//! transport::traits
//!
//! Byte storage trait definition.
//!
//! # Design
//!
//! A transport stores whole files under relative, `/`-separated paths.
//! Writes replace a file atomically: readers see the old bytes or the new
//! bytes, never a mix. Writing into a missing directory fails with
//! [`TransportError::NoSuchFile`] so callers can create it and retry.

use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The file, or the directory it should go in, does not exist.
    #[error("no such file: {0}")]
    NoSuchFile(String),

    /// The path escapes the transport root or is otherwise unusable.
    #[error("invalid transport path: {0}")]
    InvalidPath(String),

    /// Underlying I/O failure.
    #[error("transport i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for byte storage backends.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait Transport: Send + Sync {
    /// Read a whole file.
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Atomically replace a file's content.
    ///
    /// Fails with [`TransportError::NoSuchFile`] if the parent directory is
    /// missing.
    fn put_bytes(&self, path: &str, bytes: &[u8]) -> Result<(), TransportError>;

    /// Create a directory and any missing parents.
    fn mkdir(&self, path: &str) -> Result<(), TransportError>;

    /// Check if a file exists.
    ///
    /// Default implementation uses `get()`.
    fn has(&self, path: &str) -> Result<bool, TransportError> {
        match self.get(path) {
            Ok(_) => Ok(true),
            Err(TransportError::NoSuchFile(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Parent directory of a transport path, `""` for the root.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TransportError::NoSuchFile("a/b.weave".into());
        assert!(err.to_string().contains("a/b.weave"));

        let err = TransportError::InvalidPath("../x".into());
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn parent_dirs() {
        assert_eq!(parent_dir("file.weave"), "");
        assert_eq!(parent_dir("a/file.weave"), "a");
        assert_eq!(parent_dir("a/b/file.weave"), "a/b");
    }
}
