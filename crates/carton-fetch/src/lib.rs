//! Distribution downloads into self-reclaiming temp files.
//!
//! # Architecture
//!
//! - [`data`] - locators, options and progress snapshots
//! - `core` - pure helpers (retry backoff)
//! - `effects` - HTTP and SMB transports behind [`HttpClient`] and
//!   [`ShareTransport`], plus [`materialize_stream`]
//!
//! Every download lands in a [`carton_fs::TempFile`]; a failed transfer drops
//! its handle, so partial files are reclaimed like any other.
//!
//! ```no_run
//! # #[cfg(feature = "reqwest")]
//! # async fn run() -> carton_fetch::Result<()> {
//! use carton_fetch::{ClientOptions, DistributionDownloader, Downloader, MountedShare, ReqwestClient};
//! use carton_fs::{TempFileRegistry, TempFileSpec};
//!
//! let registry = TempFileRegistry::system();
//! let client = ReqwestClient::new(&ClientOptions::default())?;
//! let downloader = Downloader::new(client, MountedShare::new(), registry);
//!
//! let spec = TempFileSpec::new("setup").extension("msi").segment("dist");
//! let file = downloader.download("https://example.com/setup.msi", &spec).await?;
//! println!("{}", file.path().display());
//! # Ok(())
//! # }
//! ```

mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::retry_delay;
pub use data::{ClientOptions, FetchOptions, FetchPhase, Locator, Progress, SmbAuth, SmbLocator};
#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
pub use effects::{
    BoxStream, DistributionDownloader, Downloader, HttpBody, HttpClient, HttpDownloader,
    MountedShare, ShareFile, ShareTransport, SmbDownloader, materialize_stream,
};
pub use error::{FetchError, Result};
