//! Error types for carton-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("cannot read {locator}: {source}")]
    Share {
        locator: String,
        #[source]
        source:  io::Error,
    },

    #[error("body truncated: expected {expected} bytes, received {received}")]
    Truncated { expected: u64, received: u64 },

    #[error("file I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    TempFile(#[from] carton_fs::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// The destination name was rejected before anything was transferred.
    pub fn is_invalid_name(&self) -> bool {
        matches!(self, Self::TempFile(e) if e.is_invalid_name())
    }

    pub(crate) fn network(err: impl std::fmt::Display) -> Self { Self::Network(err.to_string()) }
}
