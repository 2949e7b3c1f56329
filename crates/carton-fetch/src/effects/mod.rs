//! Network and disk effects behind trait seams.

mod downloader;
mod http;
mod materialize;
mod smb;

pub use downloader::{DistributionDownloader, Downloader};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use http::{BoxStream, HttpBody, HttpClient, HttpDownloader};
pub use materialize::materialize_stream;
pub use smb::{MountedShare, ShareFile, ShareTransport, SmbDownloader};
