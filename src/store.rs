//! Partial-file store.
//!
//! A [`PartialStore`] manages the pair of paths belonging to one artifact:
//! the final file and a `<final-name>.tmp` cache file holding in-progress
//! bytes. The resume offset is always read back from the cache file's
//! length on disk rather than tracked in memory, so a crashed or paused
//! download can pick up exactly where the bytes stopped.
//!
//! The cache file is promoted to the final path with a single atomic rename
//! once the transfer is complete and verified.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncSeekExt;
use tracing::debug;

/// Extension appended to the final file name to form the cache path.
pub const CACHE_EXTENSION: &str = "tmp";

/// Manages the cache and final files for a single artifact.
#[derive(Debug, Clone)]
pub struct PartialStore {
    final_path: PathBuf,
    cache_path: PathBuf,
}

impl PartialStore {
    /// Creates a store for the given final artifact path.
    ///
    /// The cache path is derived deterministically: same directory, same
    /// base name, with [`CACHE_EXTENSION`] appended.
    pub fn new(final_path: PathBuf) -> Self {
        let mut cache = final_path.clone().into_os_string();
        cache.push(".");
        cache.push(CACHE_EXTENSION);
        Self {
            final_path,
            cache_path: PathBuf::from(cache),
        }
    }

    /// Path of the completed artifact file.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Path of the in-progress cache file.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Byte offset at which the next transfer attempt must resume.
    ///
    /// This is the current length of the cache file on disk, or 0 when no
    /// cache file exists.
    pub async fn resume_offset(&self) -> std::io::Result<u64> {
        match fs::metadata(&self.cache_path).await {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Whether the completed artifact file exists.
    pub async fn is_promoted(&self) -> bool {
        fs::metadata(&self.final_path).await.is_ok()
    }

    /// Opens the cache file for writing, positioned at `offset`.
    ///
    /// Parent directories are created as needed. The file is created when
    /// absent and never truncated, so bytes before `offset` are preserved.
    pub async fn writer_at(&self, offset: u64) -> std::io::Result<File> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.cache_path)
            .await?;
        file.seek(SeekFrom::Start(offset)).await?;
        Ok(file)
    }

    /// Ensures the cache file exists, without writing any bytes.
    ///
    /// Needed before promoting a zero-length artifact.
    pub async fn touch_cache(&self) -> std::io::Result<()> {
        self.writer_at(0).await.map(|_| ())
    }

    /// Atomically renames the cache file to the final path.
    pub async fn promote(&self) -> std::io::Result<()> {
        debug!("Promoting {:?} to {:?}", self.cache_path, self.final_path);
        fs::rename(&self.cache_path, &self.final_path).await
    }

    /// Deletes the cache file. Missing files are not an error.
    pub async fn remove_cache(&self) -> std::io::Result<()> {
        remove_if_present(&self.cache_path).await
    }

    /// Deletes the final file. Missing files are not an error.
    pub async fn remove_final(&self) -> std::io::Result<()> {
        remove_if_present(&self.final_path).await
    }
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
