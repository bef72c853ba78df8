//! Vendor database download and archive extraction.

use url::form_urlencoded;

use crate::config::{DB_DOWNLOAD_TIMEOUT, MAX_DB_DOWNLOAD_SIZE};
use crate::error_handling::{SignalResult, Unavailable};

/// MaxMind credentials for the vendor download tier.
#[derive(Debug, Clone)]
pub struct VendorCredentials {
    /// Account identifier. Carried for completeness; the download endpoint
    /// authenticates on the license key alone.
    pub account_id: Option<String>,
    /// License key, required for any vendor download.
    pub license_key: String,
}

/// Downloads one database edition from the vendor and returns the extracted
/// `.mmdb` bytes.
pub(crate) async fn download_edition(
    base_url: &str,
    credentials: &VendorCredentials,
    edition_id: &str,
    filename: &str,
) -> SignalResult<Vec<u8>> {
    // URL-encode the license key so special characters survive the query
    // string.
    let encoded_key =
        form_urlencoded::byte_serialize(credentials.license_key.as_bytes()).collect::<String>();
    let url = format!("{base_url}?edition_id={edition_id}&license_key={encoded_key}&suffix=tar.gz");

    log::info!("downloading {edition_id} from vendor");
    let client = reqwest::Client::builder()
        .timeout(DB_DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| Unavailable::Network(format!("failed to build download client: {e}")))?;

    let response = client.get(&url).send().await.map_err(|e| {
        if e.is_timeout() {
            Unavailable::Timeout(DB_DOWNLOAD_TIMEOUT)
        } else {
            Unavailable::Network(format!("vendor download request failed: {e}"))
        }
    })?;

    if !response.status().is_success() {
        return Err(Unavailable::Network(format!(
            "vendor returned {} for {edition_id}",
            response.status()
        )));
    }

    if let Some(length) = response.content_length() {
        if length > MAX_DB_DOWNLOAD_SIZE as u64 {
            return Err(Unavailable::Corrupt(format!(
                "archive too large: {length} bytes (max {MAX_DB_DOWNLOAD_SIZE})"
            )));
        }
    }

    let archive = response
        .bytes()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Unavailable::Timeout(DB_DOWNLOAD_TIMEOUT)
            } else {
                Unavailable::Network(format!("vendor download body failed: {e}"))
            }
        })?
        .to_vec();

    // Re-check the real size; content-length can be absent or wrong.
    if archive.len() > MAX_DB_DOWNLOAD_SIZE {
        return Err(Unavailable::Corrupt(format!(
            "archive too large: {} bytes (max {MAX_DB_DOWNLOAD_SIZE})",
            archive.len()
        )));
    }

    log::info!(
        "download complete for {edition_id} ({} bytes), extracting database",
        archive.len()
    );
    extract_mmdb(&archive, filename)
}

/// Pulls the single `.mmdb` member out of a tar.gz archive.
///
/// Member paths are untrusted: only the basename is consulted, so a hostile
/// archive with `../`-style member names cannot place a file outside the
/// database directory.
pub(crate) fn extract_mmdb(tar_gz_bytes: &[u8], filename: &str) -> SignalResult<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tar::Archive;

    let decoder = GzDecoder::new(tar_gz_bytes);
    let mut archive = Archive::new(decoder);

    let entries = archive
        .entries()
        .map_err(|e| Unavailable::Corrupt(format!("failed to read archive entries: {e}")))?;

    for entry_result in entries {
        let mut entry = entry_result
            .map_err(|e| Unavailable::Corrupt(format!("failed to read archive entry: {e}")))?;
        let path = entry
            .path()
            .map_err(|e| Unavailable::Corrupt(format!("failed to read entry path: {e}")))?;

        if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| Unavailable::Corrupt(format!("failed to read {filename}: {e}")))?;
            log::info!("extracted {filename} from archive ({} bytes)", bytes.len());
            return Ok(bytes);
        }
    }

    Err(Unavailable::Corrupt(format!(
        "{filename} not present in archive"
    )))
}
