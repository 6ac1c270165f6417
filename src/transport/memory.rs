//! transport::memory
//!
//! In-memory transport.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::traits::{parent_dir, Transport, TransportError};

#[derive(Debug, Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    dirs: HashSet<String>,
}

/// A transport keeping files in a map.
///
/// Directories are tracked so that writes into a missing directory fail the
/// same way they do on disk.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all stored files, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.state().files.keys().cloned().collect();
        files.sort();
        files
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn dir_exists(state: &State, dir: &str) -> bool {
        dir.is_empty() || state.dirs.contains(dir)
    }
}

impl Transport for MemoryTransport {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.state()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NoSuchFile(path.to_string()))
    }

    fn put_bytes(&self, path: &str, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state();
        if !Self::dir_exists(&state, parent_dir(path)) {
            return Err(TransportError::NoSuchFile(path.to_string()));
        }
        state.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), TransportError> {
        let mut state = self.state();
        let mut dir = path.trim_end_matches('/');
        while !dir.is_empty() {
            state.dirs.insert(dir.to_string());
            dir = parent_dir(dir);
        }
        Ok(())
    }

    fn has(&self, path: &str) -> Result<bool, TransportError> {
        Ok(self.state().files.contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_no_such_file() {
        let transport = MemoryTransport::new();
        assert!(matches!(
            transport.get("x"),
            Err(TransportError::NoSuchFile(_))
        ));
        assert!(!transport.has("x").unwrap());
    }

    #[test]
    fn put_and_get() {
        let transport = MemoryTransport::new();
        transport.put_bytes("x.weave", b"data").unwrap();
        assert_eq!(transport.get("x.weave").unwrap(), b"data".to_vec());
        assert!(transport.has("x.weave").unwrap());
        assert_eq!(transport.files(), vec!["x.weave".to_string()]);
    }

    #[test]
    fn put_into_missing_dir_fails_until_created() {
        let transport = MemoryTransport::new();
        assert!(matches!(
            transport.put_bytes("a/b/x.weave", b"data"),
            Err(TransportError::NoSuchFile(_))
        ));
        transport.mkdir("a/b").unwrap();
        transport.put_bytes("a/b/x.weave", b"data").unwrap();
        transport.put_bytes("a/y.weave", b"more").unwrap();
    }
}
