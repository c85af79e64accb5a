// src/storage/cache.rs

//! Local cache for downloaded report archives.
//!
//! ## Layout
//!
//! ```text
//! {dir}/
//! └── {sha256(url)}.zip
//! ```

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::CacheConfig;

/// Archive cache keyed by source URL.
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    dir: PathBuf,
    refresh: bool,
}

impl ArchiveCache {
    /// Create a cache rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            refresh: false,
        }
    }

    /// Skip reads but keep storing fresh downloads.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Cache described by configuration; `None` when no directory is set.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .dir
            .as_ref()
            .map(|dir| Self::new(dir).with_refresh(config.refresh))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a URL.
    pub fn key(url: &str) -> String {
        format!("{}.zip", hex::encode(Sha256::digest(url.as_bytes())))
    }

    fn path(&self, url: &str) -> PathBuf {
        self.dir.join(Self::key(url))
    }

    /// Cached archive for a URL, unless missing or refreshing.
    pub async fn read(&self, url: &str) -> Result<Option<Vec<u8>>> {
        if self.refresh {
            return Ok(None);
        }

        match tokio::fs::read(self.path(url)).await {
            Ok(bytes) => {
                log::debug!("Cache hit: {}", url);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Cache miss: {}", url);
                Ok(None)
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Store an archive atomically (write to temp, then rename).
    pub async fn write(&self, url: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path(url);
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
