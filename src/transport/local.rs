//! transport::local
//!
//! Transport over a local directory.
//!
//! All writes are atomic (write to temp file, then rename). A failed write
//! removes its temp file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use super::traits::{Transport, TransportError};

/// A transport rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    /// Create a transport rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a transport path to a filesystem path below the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, TransportError> {
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(TransportError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &str, source: std::io::Error) -> TransportError {
    if source.kind() == ErrorKind::NotFound {
        TransportError::NoSuchFile(path.to_string())
    } else {
        TransportError::Io {
            path: path.to_string(),
            source,
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl Transport for LocalTransport {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| io_error(path, e))
    }

    fn put_bytes(&self, path: &str, bytes: &[u8]) -> Result<(), TransportError> {
        let full = self.resolve(path)?;
        let file_name = full
            .file_name()
            .ok_or_else(|| TransportError::InvalidPath(path.to_string()))?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        let temp_path = full.with_file_name(temp_name);

        let written = write_synced(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &full));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(io_error(path, e));
        }
        Ok(())
    }

    fn mkdir(&self, path: &str) -> Result<(), TransportError> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| io_error(path, e))
    }

    fn has(&self, path: &str) -> Result<bool, TransportError> {
        Ok(self.resolve(path)?.is_file())
    }
}
