//! Database file validation.

use std::path::Path;

use anyhow::{Context, Result};

/// Checks that `path` is a structurally sound MaxMind database.
///
/// Opens the file with `maxminddb` and reads its metadata; a truncated or
/// otherwise corrupt file fails here and gets evicted by the caller so the
/// next acquisition attempt re-downloads it.
pub(crate) fn validate_database(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read database at {}", path.display()))?;
    let reader = maxminddb::Reader::from_source(bytes)
        .with_context(|| format!("failed to parse database at {}", path.display()))?;
    log::debug!(
        "validated {} (build epoch {})",
        path.display(),
        reader.metadata.build_epoch
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_missing_file() {
        let result = validate_database(Path::new("nonexistent/GeoLite2-City.mmdb"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_corrupt_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("corrupt.mmdb");
        std::fs::write(&path, b"not a maxmind database").expect("write");

        let result = validate_database(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("empty.mmdb");
        std::fs::File::create(&path).expect("create");

        assert!(validate_database(&path).is_err());
    }
}
