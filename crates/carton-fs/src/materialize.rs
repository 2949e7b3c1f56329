use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Write};

use crate::error::{Result, io_at};
use crate::handle::TempFile;
use crate::options::TempFileSpec;
use crate::registry::TempFileRegistry;

const COPY_BUFFER: usize = 64 * 1024;

impl TempFileRegistry {
    /// Creates a temp file holding every byte of `reader`.
    ///
    /// The file is registered before the copy starts. On a read or write
    /// failure the handle is dropped with the error, so the partial file is
    /// reclaimed like any other.
    pub fn create_from_reader<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        spec: &TempFileSpec,
    ) -> Result<TempFile> {
        let file = self.create_empty(spec)?;
        write_all_from(&file, reader)?;
        Ok(file)
    }

    /// Creates a temp file holding `content`. Empty content yields an empty file.
    pub fn create_from_content(
        &self,
        content: impl AsRef<[u8]>,
        spec: &TempFileSpec,
    ) -> Result<TempFile> {
        let mut content = content.as_ref();
        self.create_from_reader(&mut content, spec)
    }
}

fn write_all_from<R: Read + ?Sized>(file: &TempFile, reader: &mut R) -> Result<u64> {
    let path = file.path();
    let target = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(io_at(path))?;

    let mut writer = BufWriter::with_capacity(COPY_BUFFER, target);
    let copied = std::io::copy(reader, &mut writer).map_err(io_at(path))?;
    writer.flush().map_err(io_at(path))?;

    tracing::debug!(path = %path.display(), bytes = copied, "materialized temp file");
    Ok(copied)
}
