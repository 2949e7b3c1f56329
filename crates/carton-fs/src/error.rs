use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid path segment {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason:  &'static str,
    },

    #[error("cannot create directory {}: {source}", path.display())]
    Filesystem {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_invalid_name(&self) -> bool { matches!(self, Self::InvalidName { .. }) }

    pub fn is_filesystem(&self) -> bool {
        matches!(self, Self::Filesystem { .. } | Self::InvalidSegment { .. })
    }
}

pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::Io { path, source }
}

/// Deletion of an unreachable temp file failed.
///
/// Never returned to a caller; retained by the registry as a diagnostic.
#[derive(Debug, thiserror::Error)]
#[error("failed to reclaim {}: {source}", path.display())]
pub struct ReclaimError {
    pub path:   PathBuf,
    #[source]
    pub source: std::io::Error,
}
