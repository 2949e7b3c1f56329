use std::fmt::Display;

use bytes::Bytes;
use carton_fs::{TempFile, TempFileRegistry, TempFileSpec};
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::error::{FetchError, Result};

/// Writes `stream` chunk by chunk into a new registry-tracked temp file.
///
/// `total` is the length announced by the source; a body that ends short of
/// it fails with [`FetchError::Truncated`]. On any failure the handle is
/// dropped with the error and the partial file is reclaimed.
pub async fn materialize_stream<S, E>(
    registry: &TempFileRegistry,
    mut stream: S,
    spec: &TempFileSpec,
    total: Option<u64>,
    options: &FetchOptions,
) -> Result<TempFile>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    let file = registry.create_empty(spec)?;
    let io_err = |source| FetchError::Io {
        path: file.path().to_path_buf(),
        source,
    };

    let mut target = tokio::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(file.path())
        .await
        .map_err(io_err)?;

    options.report(Progress::new(FetchPhase::Downloading, 0, total));

    let mut received = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::network)?;
        target.write_all(&chunk).await.map_err(io_err)?;
        received += chunk.len() as u64;
        options.report(Progress::new(FetchPhase::Downloading, received, total));
    }

    target.flush().await.map_err(io_err)?;
    drop(target);

    if let Some(expected) = total
        && received < expected
    {
        return Err(FetchError::Truncated { expected, received });
    }

    tracing::debug!(path = %file.path().display(), bytes = received, "downloaded into temp file");
    options.report(Progress::new(FetchPhase::Completed, received, total));
    Ok(file)
}
