//! Object cache capability.
//!
//! The reference databases are re-downloadable blobs; a shared object store
//! lets one process's vendor download feed the next process's startup. The
//! core only consumes this interface — the transport behind it is
//! interchangeable, and an unconfigured cache is a valid state that silently
//! skips the tier.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;

/// Content-addressed blob storage consumed by the database acquirer.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    /// Fetches the blob stored under `key`. `None` means absent or
    /// unreachable — the caller cannot and does not distinguish.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `bytes` under `key`. Returns `false` on failure; a failed put
    /// shows up as a miss on the next read, never as an error.
    async fn put(&self, key: &str, bytes: &[u8]) -> bool;
}

/// Cache used when no store is configured. Every get misses, every put is
/// dropped.
pub struct DisabledCache;

#[async_trait]
impl ObjectCache for DisabledCache {
    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn put(&self, _key: &str, _bytes: &[u8]) -> bool {
        false
    }
}

/// Directory-backed object cache: keys become relative file paths under a
/// root directory. Writes are temp-file-and-rename so a concurrent reader
/// never observes a partial blob.
pub struct DirObjectCache {
    root: PathBuf,
}

impl DirObjectCache {
    /// Creates a cache rooted at `root`. The directory is created lazily on
    /// first put.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are crate-internal ("geoip/<file>"); strip any leading
        // separators so a key can never address outside the root.
        let relative: PathBuf = Path::new(key)
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.root.join(relative)
    }
}

#[async_trait]
impl ObjectCache for DirObjectCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.key_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                log::info!("object cache hit for {key} ({} bytes)", bytes.len());
                Some(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("object cache read failed for {key}: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> bool {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("object cache put failed for {key}: {e}");
                return false;
            }
        }
        let tmp = path.with_extension("tmp");
        let result = async {
            tokio::fs::write(&tmp, bytes).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;
        match result {
            Ok(()) => {
                log::info!("object cache stored {key} ({} bytes)", bytes.len());
                true
            }
            Err(e) => {
                log::warn!("object cache put failed for {key}: {e}");
                false
            }
        }
    }
}

/// Builds the object cache from configuration. No configured directory means
/// the tier is disabled — a valid, non-error state.
pub fn from_config(config: &Config) -> Arc<dyn ObjectCache> {
    match &config.object_cache_dir {
        Some(dir) => {
            log::info!("object cache enabled at {}", dir.display());
            Arc::new(DirObjectCache::new(dir.clone()))
        }
        None => {
            log::info!("no object cache configured - cache tier disabled");
            Arc::new(DisabledCache)
        }
    }
}
