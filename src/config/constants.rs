//! Configuration constants.
//!
//! Timeouts, size limits, and fixed endpoints used throughout the crate.

use std::time::Duration;

// Network operation timeouts
/// DNS query timeout in seconds.
/// Most queries complete in well under a second; failing fast keeps one slow
/// nameserver from stalling a whole lookup.
pub const DNS_TIMEOUT_SECS: u64 = 3;
/// TCP connection timeout in seconds.
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds.
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;
/// Per-request timeout for header and page probes in seconds.
pub const HTTP_PROBE_TIMEOUT_SECS: u64 = 10;
/// Timeout for a vendor database download. Generous because the city-level
/// database is tens of megabytes.
pub const DB_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

// Size limits
/// Maximum accepted size for a downloaded database archive (100MB).
/// Archives larger than this are rejected to prevent memory exhaustion.
pub const MAX_DB_DOWNLOAD_SIZE: usize = 100 * 1024 * 1024;
/// Maximum page body size fetched for text signals (2MB).
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Maximum characters of page text fed to the text extractors.
pub const MAX_TEXT_EXTRACTION_CHARS: usize = 50_000;

// Database acquisition
/// MaxMind download endpoint.
pub const MAXMIND_DOWNLOAD_BASE: &str = "https://download.maxmind.com/app/geoip_download";
/// Fallback directory for databases when the configured directory is not
/// writable. Selected once at construction, never per lookup.
pub const FALLBACK_DB_DIR: &str = ".geoip_cache";
/// Key prefix for database objects in the object cache.
pub const OBJECT_CACHE_PREFIX: &str = "geoip";
/// Database editions acquired when none are configured.
pub const DEFAULT_EDITION_IDS: &[&str] = &["GeoLite2-City", "GeoLite2-Country", "GeoLite2-ASN"];

/// Default User-Agent string for outbound probes.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; domain-origin/0.1)";
