//! Launching downloaded distributions.
//!
//! [`FileKind`] classifies a file by the known suffix its name ends with.
//! [`WindowsExecutableInstaller`] accepts `.exe` and `.msi` files and starts
//! them from their own directory, optionally waiting for completion.
//! Launch failures are logged and retained rather than returned.

mod command;
mod error;
mod installer;
mod kind;
pub mod os;

pub use command::Command;
pub use error::{CommandError, InstallError, InstallFailure, Result};
pub use installer::{DistributionInstaller, WindowsExecutableInstaller};
pub use kind::{FileKind, extension_of};
pub use os::HostOs;
