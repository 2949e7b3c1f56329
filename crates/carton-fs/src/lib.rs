//! Self-reclaiming temporary files.
//!
//! [`TempFileRegistry`] creates uniquely named files under a temp root and
//! hands out [`TempFile`] handles. Once the last clone of a handle is dropped
//! a background worker deletes the file. [`ExitGuard`] sweeps whatever is
//! left when the owning scope ends.
//!
//! ```no_run
//! use carton_fs::{TempFileRegistry, TempFileSpec};
//!
//! let registry = TempFileRegistry::system();
//! let _guard = registry.exit_guard();
//!
//! let spec = TempFileSpec::new("pkg").extension("msi").segment("dist");
//! let file = registry.create_from_content(b"payload", &spec)?;
//! assert!(file.path().exists());
//! drop(file); // deleted by the reclaim worker
//! # Ok::<(), carton_fs::Error>(())
//! ```

mod error;
mod handle;
mod materialize;
mod options;
pub mod path;
mod registry;

pub use error::{Error, ReclaimError, Result};
pub use handle::TempFile;
pub use options::{DEFAULT_EXTENSION, RegistryOptions, TempFileSpec};
pub use registry::{ExitGuard, TempFileRegistry};
