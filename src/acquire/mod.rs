//! Reference database acquisition.
//!
//! Guarantees each configured database edition is present, valid, and locally
//! readable before any lookup is attempted. Acquisition walks a tiered
//! fallback chain — local disk, object cache, vendor download — validating at
//! each tier and evicting corrupt files so the next tier (or the next
//! process) gets a clean retry. A freshly downloaded database is written back
//! to the object cache best-effort.
//!
//! Acquisition failure is never fatal to callers: it degrades the available
//! evidence for the resolver that wanted the edition, nothing more.

mod download;
mod editions;
mod validate;

pub use download::VendorCredentials;
pub use editions::DatabaseDescriptor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{Config, FALLBACK_DB_DIR, MAXMIND_DOWNLOAD_BASE};
use crate::error_handling::{SignalResult, Unavailable};
use crate::object_cache::ObjectCache;

/// Acquires and maintains the local copies of the GeoIP databases.
///
/// One instance per process, explicitly constructed and passed to whatever
/// needs it. Directory selection (including the writability probe and the
/// fallback) happens once here, never per lookup.
pub struct DatabaseAcquirer {
    dir: PathBuf,
    descriptors: Vec<DatabaseDescriptor>,
    cache: Arc<dyn ObjectCache>,
    credentials: Option<VendorCredentials>,
    download_base: String,
    // Serializes fetches so concurrent callers do not race a download; reads
    // of an already-valid file do not contend (they happen before callers get
    // here, via the returned path).
    fetch_lock: Mutex<()>,
}

impl DatabaseAcquirer {
    /// Builds the acquirer: selects and probes the database directory, and
    /// derives a descriptor per configured edition.
    pub fn new(config: &Config, cache: Arc<dyn ObjectCache>) -> Self {
        let dir = select_directory(config.db_dir.as_deref());
        log::info!("using database directory {}", dir.display());

        let descriptors = config
            .edition_ids
            .iter()
            .map(|edition| DatabaseDescriptor::new(edition, &dir))
            .collect();

        let credentials = config
            .license_key
            .as_ref()
            .map(|license_key| VendorCredentials {
                account_id: config.account_id.clone(),
                license_key: license_key.clone(),
            });
        if credentials.is_none() {
            log::info!("MAXMIND_LICENSE_KEY not set - vendor download tier disabled");
        }

        Self {
            dir,
            descriptors,
            cache,
            credentials,
            download_base: MAXMIND_DOWNLOAD_BASE.to_string(),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Overrides the vendor download endpoint (mirrors, tests).
    pub fn with_download_base(mut self, base_url: impl Into<String>) -> Self {
        self.download_base = base_url.into();
        self
    }

    /// The configured edition descriptors.
    pub fn descriptors(&self) -> &[DatabaseDescriptor] {
        &self.descriptors
    }

    /// The selected database directory.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Ensures a valid local copy of `db` exists and returns its path.
    ///
    /// Tier order: local disk, then object cache, then vendor download. A
    /// file failing validation is deleted before the next tier is tried. The
    /// vendor tier requires a license key; its absence is the distinct
    /// [`Unavailable::Unconfigured`] outcome.
    pub async fn ensure(&self, db: &DatabaseDescriptor) -> SignalResult<PathBuf> {
        let _guard = self.fetch_lock.lock().await;

        // Tier 1: local disk.
        if tokio::fs::try_exists(&db.local_path).await.unwrap_or(false) {
            match validate::validate_database(&db.local_path) {
                Ok(()) => {
                    log::info!("found valid {} locally", db.edition_id);
                    return Ok(db.local_path.clone());
                }
                Err(e) => {
                    log::warn!("existing {} failed validation: {e:#}", db.edition_id);
                    evict(&db.local_path).await;
                }
            }
        } else {
            log::info!("no local copy of {}, trying object cache", db.edition_id);
        }

        // Tier 2: object cache.
        if let Some(bytes) = self.cache.get(&db.cache_key()).await {
            match self.place_and_validate(db, &bytes).await {
                Ok(path) => {
                    log::info!("restored {} from object cache", db.edition_id);
                    return Ok(path);
                }
                Err(e) => {
                    log::warn!("cached copy of {} was invalid: {e}", db.edition_id);
                }
            }
        } else {
            log::info!(
                "object cache miss for {}, trying vendor download",
                db.edition_id
            );
        }

        // Tier 3: vendor download.
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(Unavailable::Unconfigured("MAXMIND_LICENSE_KEY"))?;
        let bytes = download::download_edition(
            &self.download_base,
            credentials,
            &db.edition_id,
            &db.filename,
        )
        .await?;
        let path = self.place_and_validate(db, &bytes).await?;
        log::info!("downloaded and validated {}", db.edition_id);

        // Write back so future processes can skip the vendor. Best-effort: a
        // failed put never fails ensure().
        if !self.cache.put(&db.cache_key(), &bytes).await {
            log::warn!("could not write {} back to object cache", db.edition_id);
        }

        Ok(path)
    }

    /// Walks every configured edition once, logging per-edition outcomes.
    /// Used at startup; a failed edition degrades only itself.
    pub async fn ensure_all(&self) -> Vec<(DatabaseDescriptor, SignalResult<PathBuf>)> {
        let mut results = Vec::with_capacity(self.descriptors.len());
        for db in &self.descriptors {
            let outcome = self.ensure(db).await;
            match &outcome {
                Ok(path) => log::info!("{} ready at {}", db.edition_id, path.display()),
                Err(reason) => log::warn!("{} unavailable: {reason}", db.edition_id),
            }
            results.push((db.clone(), outcome));
        }
        results
    }

    /// Atomically installs `bytes` at the descriptor's path and validates the
    /// result, evicting it again if validation fails.
    async fn place_and_validate(
        &self,
        db: &DatabaseDescriptor,
        bytes: &[u8],
    ) -> SignalResult<PathBuf> {
        write_atomic(&db.local_path, bytes)
            .await
            .map_err(|e| Unavailable::Io(format!("failed to write {}: {e}", db.filename)))?;
        match validate::validate_database(&db.local_path) {
            Ok(()) => Ok(db.local_path.clone()),
            Err(e) => {
                evict(&db.local_path).await;
                Err(Unavailable::Corrupt(format!("{e:#}")))
            }
        }
    }
}

/// Writes a whole file via temp-file-and-rename so a concurrent reader never
/// observes a partially written database.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("mmdb.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// Deletes an invalid database file so the next attempt re-acquires it.
async fn evict(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::info!("removed invalid database file {}", path.display()),
        Err(e) => log::error!(
            "failed to remove invalid database {}: {e}",
            path.display()
        ),
    }
}

/// Picks the database directory: the configured one when it passes a
/// probe-file write/delete check, otherwise the fixed fallback directory.
fn select_directory(preferred: Option<&Path>) -> PathBuf {
    let candidate = preferred
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DB_DIR));

    match probe_directory(&candidate) {
        Ok(()) => candidate,
        Err(e) => {
            log::error!("cannot access {}: {e}", candidate.display());
            let fallback = PathBuf::from(FALLBACK_DB_DIR);
            if let Err(e) = std::fs::create_dir_all(&fallback) {
                log::error!("failed to create fallback directory: {e}");
            }
            log::info!("falling back to {}", fallback.display());
            fallback
        }
    }
}

/// Verifies read-write access by creating and deleting a probe file.
fn probe_directory(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".write_test");
    std::fs::write(&probe, b"")?;
    std::fs::remove_file(&probe)
}
