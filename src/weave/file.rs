//! weave::file
//!
//! A weave persisted through a transport.
//!
//! # Storage
//!
//! - `<name>.weave` - The whole weave in the v5 text format
//!
//! # Invariants
//!
//! - Every mutation rewrites the entire file, so the stored copy always
//!   reflects the latest complete state
//! - Reserved names are refused on write
//! - Saving requires the weave's scope to still be current

use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::error::WeaveError;
use super::format;
use super::{Weave, WeaveOptions};
use crate::core::scope::Scope;
use crate::transport::{parent_dir, Transport, TransportError};

/// Suffix of weave files.
pub const WEAVE_SUFFIX: &str = ".weave";

/// Errors from persisted weaves.
#[derive(Debug, Error)]
pub enum WeaveFileError {
    #[error(transparent)]
    Weave(#[from] WeaveError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A [`Weave`] bound to a transport and a file name.
///
/// Read access goes through `Deref` to the inner weave. Mutations go
/// through this type so that they are saved.
pub struct WeaveFile {
    name: String,
    transport: Arc<dyn Transport>,
    weave: Weave,
}

impl WeaveFile {
    /// Open the weave stored as `<name>.weave`.
    ///
    /// With `create`, a missing file is created empty; otherwise it is an
    /// error.
    pub fn open(
        name: &str,
        transport: Arc<dyn Transport>,
        options: WeaveOptions,
        create: bool,
    ) -> Result<Self, WeaveFileError> {
        Self::open_scoped(name, transport, options, create, None)
    }

    /// Open the weave bound to a transaction scope.
    ///
    /// See [`WeaveFile::open`].
    pub fn open_scoped(
        name: &str,
        transport: Arc<dyn Transport>,
        options: WeaveOptions,
        create: bool,
        scope: Option<Arc<dyn Scope>>,
    ) -> Result<Self, WeaveFileError> {
        let mut weave = Weave::with_options(options).with_label(name);
        if let Some(scope) = scope {
            weave = weave.with_scope(scope);
        }

        let mut file = Self {
            name: name.to_string(),
            transport,
            weave,
        };
        match file.transport.get(&file.path()) {
            Ok(bytes) => format::read_into(bytes.as_slice(), &mut file.weave)?,
            Err(TransportError::NoSuchFile(_)) if create => {
                debug!(weave = name, "creating new weave file");
                file.save()?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(file)
    }

    /// Name of the weave, without suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport path of the weave file.
    pub fn path(&self) -> String {
        format!("{}{}", self.name, WEAVE_SUFFIX)
    }

    /// The in-memory weave.
    pub fn weave(&self) -> &Weave {
        &self.weave
    }

    /// Add a version and save.
    ///
    /// # Errors
    ///
    /// [`WeaveError::ReservedNameRejected`] for a reserved name, plus
    /// everything [`Weave::add`] and saving can fail with.
    pub fn add(
        &mut self,
        name: &str,
        parents: &[&str],
        lines: &[Vec<u8>],
    ) -> Result<usize, WeaveFileError> {
        if self.weave.name_policy().is_reserved(name) {
            return Err(WeaveError::ReservedNameRejected(name.to_string()).into());
        }
        let index = self.weave.add(name, parents, lines)?;
        self.save()?;
        Ok(index)
    }

    /// Join another weave into this one and save.
    pub fn join(&mut self, other: &Weave) -> Result<(), WeaveFileError> {
        self.weave.join(other)?;
        self.save()
    }

    /// Write a copy of the weave as `<name>.weave` on another transport.
    pub fn copy_to(&self, name: &str, transport: &dyn Transport) -> Result<(), WeaveFileError> {
        let bytes = format::to_bytes(&self.weave);
        transport.put_bytes(&format!("{}{}", name, WEAVE_SUFFIX), &bytes)?;
        Ok(())
    }

    /// Rewrite the whole file.
    fn save(&self) -> Result<(), WeaveFileError> {
        self.weave.check_write_ok()?;
        let bytes = format::to_bytes(&self.weave);
        let path = self.path();
        match self.transport.put_bytes(&path, &bytes) {
            Err(TransportError::NoSuchFile(_)) => {
                self.transport.mkdir(parent_dir(&path))?;
                self.transport.put_bytes(&path, &bytes)?;
            }
            other => other?,
        }
        debug!(weave = %self.name, bytes = bytes.len(), "saved weave file");
        Ok(())
    }
}

impl Deref for WeaveFile {
    type Target = Weave;

    fn deref(&self) -> &Weave {
        &self.weave
    }
}

impl std::fmt::Debug for WeaveFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeaveFile")
            .field("name", &self.name)
            .field("weave", &self.weave)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn text(lines: &[&str]) -> Vec<Vec<u8>> {
        lines.iter().map(|l| l.as_bytes().to_vec()).collect()
    }

    fn memory() -> Arc<MemoryTransport> {
        Arc::new(MemoryTransport::new())
    }

    #[test]
    fn open_missing_without_create_fails() {
        let transport = memory();
        let err = WeaveFile::open("doc", transport, WeaveOptions::default(), false).unwrap_err();
        assert!(matches!(
            err,
            WeaveFileError::Transport(TransportError::NoSuchFile(_))
        ));
    }

    #[test]
    fn create_saves_empty_weave() {
        let transport = memory();
        let file = WeaveFile::open("doc", transport.clone(), WeaveOptions::default(), true).unwrap();
        assert!(file.is_empty());
        assert_eq!(
            transport.get("doc.weave").unwrap(),
            b"# weave file v5\nw\nW\n".to_vec()
        );
    }

    #[test]
    fn add_saves_and_reopens() {
        let transport = memory();
        let mut file =
            WeaveFile::open("doc", transport.clone(), WeaveOptions::default(), true).unwrap();
        file.add("v1", &[], &text(&["a\n"])).unwrap();
        file.add("v2", &["v1"], &text(&["a\n", "b\n"])).unwrap();

        let reopened = WeaveFile::open("doc", transport, WeaveOptions::default(), false).unwrap();
        assert_eq!(reopened.weave(), file.weave());
        assert_eq!(reopened.get("v2").unwrap(), text(&["a\n", "b\n"]));
    }

    #[test]
    fn save_creates_missing_directory() {
        let transport = memory();
        WeaveFile::open("sub/dir/doc", transport.clone(), WeaveOptions::default(), true).unwrap();
        assert!(transport.has("sub/dir/doc.weave").unwrap());
    }

    #[test]
    fn reserved_names_are_refused() {
        let transport = memory();
        let mut file = WeaveFile::open("doc", transport, WeaveOptions::default(), true).unwrap();
        assert!(matches!(
            file.add("current:", &[], &text(&["x\n"])),
            Err(WeaveFileError::Weave(WeaveError::ReservedNameRejected(_)))
        ));
        assert!(file.is_empty());
    }

    #[test]
    fn copy_to_other_transport() {
        let transport = memory();
        let mut file = WeaveFile::open("doc", transport, WeaveOptions::default(), true).unwrap();
        file.add("v1", &[], &text(&["a\n"])).unwrap();

        let other = MemoryTransport::new();
        file.copy_to("copy", &other).unwrap();
        let copied = format::from_bytes(&other.get("copy.weave").unwrap()).unwrap();
        assert_eq!(&copied, file.weave());
    }

    #[test]
    fn join_saves() {
        let transport = memory();
        let mut file =
            WeaveFile::open("doc", transport.clone(), WeaveOptions::default(), true).unwrap();
        let mut other = Weave::new();
        other.add("x", &[], &text(&["x\n"])).unwrap();
        file.join(&other).unwrap();

        let reopened = WeaveFile::open("doc", transport, WeaveOptions::default(), false).unwrap();
        assert!(reopened.has_version("x"));
    }

    #[test]
    fn garbage_file_is_not_a_weave() {
        let transport = memory();
        transport.put_bytes("doc.weave", b"hello").unwrap();
        assert!(matches!(
            WeaveFile::open("doc", transport, WeaveOptions::default(), false),
            Err(WeaveFileError::Weave(WeaveError::NotAWeaveFile(_)))
        ));
    }
}
