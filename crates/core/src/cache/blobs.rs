//! Blob storage sharded by filename.
//!
//! A blob named `report.pdf` lives at `<root>/r/e/p/report.pdf`: one
//! directory per leading character, three levels deep. Filenames must be
//! unique across the whole tree; sharding only bounds directory fan-out.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::Error;

/// Number of leading characters turned into shard directories.
pub const SHARD_DEPTH: usize = 3;

/// Filesystem store for large binary artifacts.
#[derive(Clone, Debug)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derive the shard path for `filename`, creating missing directories.
    pub fn blob_path(&self, filename: &str) -> Result<PathBuf, Error> {
        let dir = self.shard_dir(filename)?;
        fs::create_dir_all(&dir)?;
        Ok(dir.join(filename))
    }

    fn shard_dir(&self, filename: &str) -> Result<PathBuf, Error> {
        let len = filename.chars().count();
        if len < SHARD_DEPTH {
            return Err(Error::InvalidFilename(format!("filename is too small: {len} < {SHARD_DEPTH}")));
        }
        if filename.contains(['/', '\\']) {
            return Err(Error::InvalidFilename(format!("not a plain file name: {filename}")));
        }

        let mut dir = self.root.clone();
        for c in filename.chars().take(SHARD_DEPTH) {
            dir.push(c.to_string());
        }
        Ok(dir)
    }

    /// Read the whole blob named `filename`.
    pub fn read(&self, filename: &str) -> Result<Vec<u8>, Error> {
        let path = self.shard_dir(filename)?.join(filename);
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(format!("blob {}", path.display())),
            _ => Error::Io(e),
        })
    }

    /// Copy `reader` into the blob named `filename`, replacing any previous content.
    ///
    /// The bytes land in a temporary sibling first and are renamed over the
    /// blob only once fully written, so a failed copy leaves the old blob intact.
    /// Returns the number of bytes written.
    pub fn write(&self, filename: &str, mut reader: impl Read) -> Result<u64, Error> {
        let dir = self.shard_dir(filename)?;
        fs::create_dir_all(&dir)?;
        let path = dir.join(filename);

        let mut temp = partial_file(&dir)?;
        let written = io::copy(&mut reader, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(path = %path.display(), bytes = written, "wrote blob");
        Ok(written)
    }

    /// Async counterpart of [`BlobStore::write`], streaming `reader` to disk
    /// without buffering it in memory.
    pub async fn write_async<R>(&self, filename: &str, reader: &mut R) -> Result<u64, Error>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let dir = self.shard_dir(filename)?;
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(filename);

        let temp = tokio::task::spawn_blocking(move || partial_file(&dir))
            .await
            .map_err(io::Error::other)??;
        let (file, temp_path) = temp.into_parts();

        let mut file = tokio::fs::File::from_std(file);
        let written = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let target = path.clone();
        tokio::task::spawn_blocking(move || temp_path.persist(&target))
            .await
            .map_err(io::Error::other)?
            .map_err(|e| Error::Io(e.error))?;

        tracing::debug!(path = %path.display(), bytes = written, "wrote blob");
        Ok(written)
    }
}

/// Hidden scratch file in `dir`, removed on drop unless persisted.
fn partial_file(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new().prefix(".").suffix(".part").tempfile_in(dir)
}
