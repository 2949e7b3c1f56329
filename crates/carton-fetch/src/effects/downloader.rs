use std::future::Future;

use carton_fs::{TempFile, TempFileRegistry, TempFileSpec};

use crate::data::{FetchOptions, Locator};
use crate::effects::http::{HttpClient, HttpDownloader};
use crate::effects::smb::{ShareTransport, SmbDownloader};
use crate::error::{FetchError, Result};

/// Retrieves a remote distribution into a registry-tracked temp file.
pub trait DistributionDownloader: Send + Sync {
    /// Parses `locator`, checks `spec`, then transfers the content.
    ///
    /// Nothing is transferred when the locator or the name is rejected.
    fn download(
        &self,
        locator: &str,
        spec: &TempFileSpec,
    ) -> impl Future<Output = Result<TempFile>> + Send;
}

impl<C: HttpClient> DistributionDownloader for HttpDownloader<C> {
    async fn download(&self, locator: &str, spec: &TempFileSpec) -> Result<TempFile> {
        match Locator::parse(locator)? {
            Locator::Http(url) => self.fetch(&url, spec).await,
            other => Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
        }
    }
}

impl<T: ShareTransport> DistributionDownloader for SmbDownloader<T> {
    async fn download(&self, locator: &str, spec: &TempFileSpec) -> Result<TempFile> {
        match Locator::parse(locator)? {
            Locator::Smb(smb) => self.fetch(&smb, spec).await,
            other => Err(FetchError::UnsupportedScheme(other.scheme().to_string())),
        }
    }
}

/// Dispatches on the locator scheme to the HTTP or SMB downloader.
pub struct Downloader<C, T> {
    http: HttpDownloader<C>,
    smb:  SmbDownloader<T>,
}

impl<C: HttpClient, T: ShareTransport> Downloader<C, T> {
    /// Both halves share one registry.
    pub fn new(client: C, transport: T, registry: TempFileRegistry) -> Self {
        Self {
            http: HttpDownloader::new(client, registry.clone()),
            smb:  SmbDownloader::new(transport, registry),
        }
    }

    pub fn from_parts(http: HttpDownloader<C>, smb: SmbDownloader<T>) -> Self { Self { http, smb } }

    pub fn with_options(self, options: FetchOptions) -> Self {
        Self {
            http: self.http.with_options(options.clone()),
            smb:  self.smb.with_options(options),
        }
    }

    pub fn http(&self) -> &HttpDownloader<C> { &self.http }

    pub fn smb(&self) -> &SmbDownloader<T> { &self.smb }

    pub async fn fetch(&self, locator: &Locator, spec: &TempFileSpec) -> Result<TempFile> {
        tracing::debug!(%locator, name = spec.base_name(), "downloading distribution");
        match locator {
            Locator::Http(url) => self.http.fetch(url, spec).await,
            Locator::Smb(smb) => self.smb.fetch(smb, spec).await,
        }
    }
}

impl<C: HttpClient, T: ShareTransport> DistributionDownloader for Downloader<C, T> {
    async fn download(&self, locator: &str, spec: &TempFileSpec) -> Result<TempFile> {
        let locator = Locator::parse(locator)?;
        self.fetch(&locator, spec).await
    }
}
