use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::kind::FileKind;

pub type Result<T> = std::result::Result<T, InstallError>;

/// Rejections raised before any process is started.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported distribution format for {}: {kind} (extension {extension:?})", path.display())]
    UnsupportedFormat {
        path:      PathBuf,
        extension: String,
        kind:      FileKind,
    },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {cmd}: {source}")]
    Spawn { cmd: String, source: io::Error },

    #[error("failed to wait for {cmd}: {source}")]
    Wait { cmd: String, source: io::Error },

    #[error("{cmd} exited with {status}")]
    Exit { cmd: String, status: ExitStatus },
}

/// A launch that did not succeed, kept for later inspection.
#[derive(Debug, Error)]
#[error("installing {} failed: {source}", file.display())]
pub struct InstallFailure {
    pub file:   PathBuf,
    #[source]
    pub source: CommandError,
}
