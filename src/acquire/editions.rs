//! Database edition descriptors.

use std::path::{Path, PathBuf};

use crate::config::OBJECT_CACHE_PREFIX;

/// One required database edition and where its local copy lives.
///
/// Constructed at startup from the configured edition list. The file at
/// `local_path` is only ever replaced wholesale (temp file + rename) or
/// deleted when validation fails, never mutated in place.
#[derive(Debug, Clone)]
pub struct DatabaseDescriptor {
    /// Vendor edition identifier, e.g. `GeoLite2-City`.
    pub edition_id: String,
    /// Database file name, e.g. `GeoLite2-City.mmdb`.
    pub filename: String,
    /// Full path of the local copy inside the database directory.
    pub local_path: PathBuf,
}

impl DatabaseDescriptor {
    /// Builds the descriptor for `edition_id` under `dir`.
    pub fn new(edition_id: &str, dir: &Path) -> Self {
        let filename = format!("{edition_id}.mmdb");
        let local_path = dir.join(&filename);
        Self {
            edition_id: edition_id.to_string(),
            filename,
            local_path,
        }
    }

    /// Object cache key for this edition's database file.
    pub fn cache_key(&self) -> String {
        format!("{OBJECT_CACHE_PREFIX}/{}", self.filename)
    }
}
