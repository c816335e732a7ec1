//! Store handle: the page database and blob root, opened together.
//!
//! The handle is cheap to clone so several spiders can share one store.
//! One owner calls [`Store::close`]; the database stays open until every
//! clone is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use super::blobs::BlobStore;
use super::pages::PageStore;
use crate::{AppConfig, Error};

/// Page database plus blob root.
#[derive(Clone, Debug)]
pub struct Store {
    pages: PageStore,
    blobs: BlobStore,
}

impl Store {
    /// Open the sled database at `db_path` and root blobs at `blob_dir`.
    ///
    /// Both directories are created if missing; they may be the same.
    pub fn open(blob_dir: impl Into<PathBuf>, db_path: impl AsRef<Path>) -> Result<Self, Error> {
        let blob_dir = blob_dir.into();
        fs::create_dir_all(&blob_dir)?;

        let db_path = db_path.as_ref();
        let db = sled::open(db_path)?;
        tracing::debug!(db = %db_path.display(), blobs = %blob_dir.display(), "opened page store");

        Ok(Self { pages: PageStore::new(db), blobs: BlobStore::new(blob_dir) })
    }

    /// Open the paths named in `config`.
    pub fn open_config(config: &AppConfig) -> Result<Self, Error> {
        Self::open(&config.blob_dir, &config.db_path)
    }

    /// Open a throwaway page database that is deleted on drop.
    ///
    /// Blobs still go to `blob_dir`, which is created if missing.
    pub fn open_temporary(blob_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let blob_dir = blob_dir.into();
        fs::create_dir_all(&blob_dir)?;
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { pages: PageStore::new(db), blobs: BlobStore::new(blob_dir) })
    }

    pub fn pages(&self) -> &PageStore {
        &self.pages
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Flush pending writes and release this handle.
    pub fn close(self) -> Result<(), Error> {
        let flushed = self.pages.db().flush()?;
        tracing::debug!(bytes = flushed, "closed page store");
        Ok(())
    }
}
