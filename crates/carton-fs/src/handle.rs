use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, io_at};
use crate::registry::{Shared, Ticket, TicketId};

/// A temporary file tracked by a [`TempFileRegistry`](crate::TempFileRegistry).
///
/// Clones share one tracking slot. The file stays on disk while any clone is
/// alive; dropping the last clone hands the path to the reclaim worker.
#[derive(Clone)]
pub struct TempFile {
    inner: Arc<Tracked>,
}

struct Tracked {
    path:   PathBuf,
    id:     TicketId,
    shared: Arc<Shared>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.shared.enqueue(Ticket {
            path: std::mem::take(&mut self.path),
            id:   self.id,
        });
    }
}

impl TempFile {
    pub(crate) fn new(path: PathBuf, id: TicketId, shared: Arc<Shared>) -> Self {
        Self {
            inner: Arc::new(Tracked { path, id, shared }),
        }
    }

    pub fn path(&self) -> &Path { &self.inner.path }

    pub fn file_name(&self) -> Cow<'_, str> {
        self.inner
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    }

    pub fn len(&self) -> Result<u64> {
        std::fs::metadata(self.path())
            .map(|m| m.len())
            .map_err(io_at(self.path()))
    }

    pub fn is_empty(&self) -> Result<bool> { self.len().map(|len| len == 0) }

    /// Opens the file read-only.
    pub fn open(&self) -> Result<File> { File::open(self.path()).map_err(io_at(self.path())) }

    pub fn read(&self) -> Result<Vec<u8>> { std::fs::read(self.path()).map_err(io_at(self.path())) }

    /// Number of live clones of this handle.
    pub fn handle_count(&self) -> usize { Arc::strong_count(&self.inner) }
}

impl AsRef<Path> for TempFile {
    fn as_ref(&self) -> &Path { self.path() }
}

impl fmt::Debug for TempFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TempFile").field(&self.inner.path).finish()
    }
}

impl PartialEq for TempFile {
    fn eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

impl Eq for TempFile {}

#[cfg(test)]
mod tests {
    use crate::{RegistryOptions, TempFileRegistry, TempFileSpec};
    use tempfile::tempdir;

    #[test]
    fn test_handle_accessors() {
        let root = tempdir().unwrap();
        let registry = TempFileRegistry::new(RegistryOptions::new().root(root.path()));
        let file = registry.create_empty(&TempFileSpec::new("acc").extension("txt")).unwrap();

        assert!(file.is_empty().unwrap());
        assert!(file.open().is_ok());
        assert_eq!(file.read().unwrap(), b"");
        assert_eq!(file.as_ref(), file.path());
        assert!(format!("{file:?}").contains("acc"));
    }

    #[test]
    fn test_clones_are_equal_and_counted() {
        let root = tempdir().unwrap();
        let registry = TempFileRegistry::new(RegistryOptions::new().root(root.path()));
        let file = registry.create_empty(&TempFileSpec::new("eq")).unwrap();
        let other = registry.create_empty(&TempFileSpec::new("eq")).unwrap();
        let clone = file.clone();

        assert_eq!(file, clone);
        assert_ne!(file, other);
        assert_eq!(file.handle_count(), 2);
        drop(clone);
        assert_eq!(file.handle_count(), 1);
    }
}
