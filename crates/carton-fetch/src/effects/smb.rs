use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use carton_fs::{TempFile, TempFileRegistry, TempFileSpec};

use crate::data::{FetchOptions, FetchPhase, Progress, SmbAuth, SmbLocator};
use crate::error::{FetchError, Result};

/// A file opened on a share, ready to be copied.
pub struct ShareFile<R> {
    /// Size reported by the share, if known.
    pub length: Option<u64>,
    pub reader: R,
}

/// Blocking access to files on SMB shares.
///
/// Runs on a blocking thread; implementations may do synchronous I/O freely.
pub trait ShareTransport: Send + Sync + 'static {
    type Reader: Read + Send;

    fn open(&self, locator: &SmbLocator, auth: &SmbAuth) -> io::Result<ShareFile<Self::Reader>>;
}

/// Reads shares through the host's SMB client.
///
/// On Windows `smb://host/share/p` maps to `\\host\share\p` and the session of
/// the current user authenticates. Elsewhere shares are expected to be mounted
/// as `<mount_root>/host/share`, with credentials handled by the mount.
#[derive(Clone, Debug, Default)]
pub struct MountedShare {
    mount_root: Option<PathBuf>,
}

impl MountedShare {
    pub const DEFAULT_MOUNT_ROOT: &'static str = "/mnt/smb";

    pub fn new() -> Self { Self::default() }

    pub fn mount_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mount_root = Some(root.into());
        self
    }

    pub fn maybe_mount_root(mut self, root: Option<PathBuf>) -> Self {
        self.mount_root = root;
        self
    }

    /// Local path under which `locator` is reachable.
    pub fn resolve(&self, locator: &SmbLocator) -> PathBuf {
        let mut path = match &self.mount_root {
            Some(root) => root.clone(),
            None if cfg!(windows) => PathBuf::from(format!(r"\\{}\{}", locator.host(), locator.share())),
            None => PathBuf::from(Self::DEFAULT_MOUNT_ROOT),
        };
        if self.mount_root.is_some() || !cfg!(windows) {
            path.push(locator.host());
            path.push(locator.share());
        }
        path.extend(locator.path());
        path
    }
}

impl ShareTransport for MountedShare {
    type Reader = File;

    fn open(&self, locator: &SmbLocator, auth: &SmbAuth) -> io::Result<ShareFile<File>> {
        let path = self.resolve(locator);
        let principal = auth.principal().unwrap_or_else(|| "anonymous".to_string());
        tracing::debug!(path = %path.display(), %principal, "opening share file");
        let reader = File::open(&path)?;
        let length = reader.metadata().ok().map(|m| m.len());
        Ok(ShareFile { length, reader })
    }
}

/// Downloads `smb` locators into the temp file registry.
pub struct SmbDownloader<T> {
    transport:    Arc<T>,
    registry:     TempFileRegistry,
    default_auth: SmbAuth,
    options:      FetchOptions,
}

impl<T: ShareTransport> SmbDownloader<T> {
    pub fn new(transport: T, registry: TempFileRegistry) -> Self {
        Self {
            transport: Arc::new(transport),
            registry,
            default_auth: SmbAuth::Anonymous,
            options: FetchOptions::default(),
        }
    }

    /// Credential used when the locator carries none.
    pub fn default_auth(mut self, auth: SmbAuth) -> Self {
        self.default_auth = auth;
        self
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &TempFileRegistry { &self.registry }

    pub async fn fetch(&self, locator: &SmbLocator, spec: &TempFileSpec) -> Result<TempFile> {
        self.registry.check_spec(spec)?;
        self.options
            .report(Progress::new(FetchPhase::Connecting, 0, None));

        let transport = self.transport.clone();
        let registry = self.registry.clone();
        let options = self.options.clone();
        let auth = locator.auth().unwrap_or(&self.default_auth).clone();
        let locator = locator.clone();
        let spec = spec.clone();
        let display = locator.to_string();

        tokio::task::spawn_blocking(move || {
            copy_share(&*transport, &registry, &locator, &auth, &spec, &options)
        })
        .await
        .map_err(|e| FetchError::Share {
            locator: display,
            source:  io::Error::other(e),
        })?
    }
}

fn copy_share<T: ShareTransport>(
    transport: &T,
    registry: &TempFileRegistry,
    locator: &SmbLocator,
    auth: &SmbAuth,
    spec: &TempFileSpec,
    options: &FetchOptions,
) -> Result<TempFile> {
    let ShareFile { length, reader } =
        transport
            .open(locator, auth)
            .map_err(|source| FetchError::Share {
                locator: locator.to_string(),
                source,
            })?;

    options.report(Progress::new(FetchPhase::Downloading, 0, length));
    let mut reporting = Reporting {
        inner: reader,
        options,
        total: length,
        read: 0,
    };
    let file = registry.create_from_reader(&mut reporting, spec)?;
    let received = reporting.read;

    if let Some(expected) = length
        && received < expected
    {
        return Err(FetchError::Truncated { expected, received });
    }

    tracing::debug!(locator = %locator, path = %file.path().display(), bytes = received, "copied share file");
    options.report(Progress::new(FetchPhase::Completed, received, length));
    Ok(file)
}

struct Reporting<'a, R> {
    inner:   R,
    options: &'a FetchOptions,
    total:   Option<u64>,
    read:    u64,
}

impl<R: Read> Read for Reporting<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.read += n as u64;
            self.options
                .report(Progress::new(FetchPhase::Downloading, self.read, self.total));
        }
        Ok(n)
    }
}
