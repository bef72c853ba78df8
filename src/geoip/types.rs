//! GeoIP data structures.

use std::fmt;

use serde::Serialize;

/// Which mechanism produced an [`IpLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Looked up in a MaxMind database.
    Maxmind,
    /// Inferred from a hardcoded IP-prefix heuristic.
    IpPattern,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSource::Maxmind => f.write_str("maxmind"),
            LocationSource::IpPattern => f.write_str("ip_pattern"),
        }
    }
}

/// IP-derived location evidence. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct IpLocation {
    /// Country name, if any database (or heuristic) yielded one.
    pub country: Option<String>,
    /// City name from the city-level database.
    pub city: Option<String>,
    /// Latitude from the city-level database.
    pub latitude: Option<f64>,
    /// Longitude from the city-level database.
    pub longitude: Option<f64>,
    /// Additive confidence score in `[0, 1]`.
    pub confidence: f64,
    /// Which mechanism produced this location.
    pub source: LocationSource,
}

/// Raw per-database facts for a resolved IP, before any scoring or fusion.
#[derive(Debug, Clone, Default)]
pub struct IpFacts {
    /// The resolved IPv4 address.
    pub ip: Option<String>,
    /// Reverse-DNS hostname of the resolved address.
    pub hostname: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Subdivision (state/region) name.
    pub region: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Autonomous system number.
    pub asn: Option<u32>,
    /// Autonomous system organization.
    pub asn_org: Option<String>,
}
