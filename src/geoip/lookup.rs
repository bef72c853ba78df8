//! Database query helpers and scoring.
//!
//! Wraps the maxminddb lookup/decode API and keeps the confidence arithmetic
//! and the last-resort IP-prefix heuristics in one place.

use std::net::{IpAddr, Ipv4Addr};

use maxminddb::Reader;

use super::types::{IpLocation, LocationSource};

/// City-level facts decoded from the city database.
#[derive(Debug, Clone, Default)]
pub(crate) struct CityFacts {
    pub(crate) country: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) latitude: Option<f64>,
    pub(crate) longitude: Option<f64>,
}

/// Queries the city database for `ip`.
pub(crate) fn query_city(reader: &Reader<Vec<u8>>, ip: IpAddr) -> Option<CityFacts> {
    let lookup = reader.lookup(ip).ok()?;
    if !lookup.has_data() {
        return None;
    }
    let city: maxminddb::geoip2::City = match lookup.decode() {
        Ok(Some(city)) => city,
        _ => return None,
    };

    let mut facts = CityFacts {
        country: city.country.names.english.map(|s| s.to_string()),
        city: city.city.names.english.map(|s| s.to_string()),
        region: None,
        latitude: city.location.latitude,
        longitude: city.location.longitude,
    };
    if let Some(subdivision) = city.subdivisions.first() {
        facts.region = subdivision.names.english.map(|s| s.to_string());
    }
    Some(facts)
}

/// Queries the country database for `ip`. Narrower fallback when the city
/// database had nothing.
pub(crate) fn query_country(reader: &Reader<Vec<u8>>, ip: IpAddr) -> Option<String> {
    let lookup = reader.lookup(ip).ok()?;
    if !lookup.has_data() {
        return None;
    }
    let country: maxminddb::geoip2::Country = match lookup.decode() {
        Ok(Some(country)) => country,
        _ => return None,
    };
    country.country.names.english.map(|s| s.to_string())
}

/// Queries the ASN database for `ip`, returning (number, organization).
pub(crate) fn query_asn(
    reader: &Reader<Vec<u8>>,
    ip: IpAddr,
) -> Option<(Option<u32>, Option<String>)> {
    let lookup = reader.lookup(ip).ok()?;
    if !lookup.has_data() {
        return None;
    }
    let asn: maxminddb::geoip2::Asn = match lookup.decode() {
        Ok(Some(asn)) => asn,
        _ => return None,
    };
    Some((
        asn.autonomous_system_number,
        asn.autonomous_system_organization.map(|s| s.to_string()),
    ))
}

/// Additive confidence for database-backed facts: city-level data is the
/// strongest evidence, then country, ASN corroboration, and coordinates.
/// The addends total exactly 1.0, so no cap is needed.
pub(crate) fn additive_confidence(
    city: bool,
    country: bool,
    asn_org: bool,
    coordinates: bool,
) -> f64 {
    let mut confidence = 0.0;
    if city {
        confidence += 0.4;
    }
    if country {
        confidence += 0.2;
    }
    if asn_org {
        confidence += 0.2;
    }
    if coordinates {
        confidence += 0.2;
    }
    confidence
}

/// Last-resort inference from well-known cloud address prefixes, used only
/// when no database yielded anything.
pub(crate) fn pattern_fallback(ip: Ipv4Addr) -> Option<IpLocation> {
    let text = ip.to_string();
    if text.starts_with("17.") || text.starts_with("208.") {
        // Apple / legacy US hosting ranges.
        return Some(IpLocation {
            country: Some("United States".to_string()),
            city: None,
            latitude: None,
            longitude: None,
            confidence: 0.4,
            source: LocationSource::IpPattern,
        });
    }
    if text.starts_with("34.") || text.starts_with("35.") {
        // Google Cloud ranges.
        return Some(IpLocation {
            country: Some("United States".to_string()),
            city: None,
            latitude: None,
            longitude: None,
            confidence: 0.3,
            source: LocationSource::IpPattern,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_confidence_full_evidence() {
        // City + country + ASN org + coordinates is the maximum score.
        assert_eq!(additive_confidence(true, true, true, true), 1.0);
    }

    #[test]
    fn test_additive_confidence_partial_evidence() {
        assert_eq!(additive_confidence(false, true, false, false), 0.2);
        assert!((additive_confidence(true, false, false, true) - 0.6).abs() < 1e-9);
        assert!((additive_confidence(true, true, false, false) - 0.6).abs() < 1e-9);
        assert_eq!(additive_confidence(false, false, false, false), 0.0);
    }

    #[test]
    fn test_pattern_fallback_apple_range() {
        let location = pattern_fallback(Ipv4Addr::new(17, 2, 3, 4)).expect("apple range");
        assert_eq!(location.country.as_deref(), Some("United States"));
        assert_eq!(location.confidence, 0.4);
        assert_eq!(location.source, LocationSource::IpPattern);
        assert!(location.city.is_none());
    }

    #[test]
    fn test_pattern_fallback_google_cloud_range() {
        let location = pattern_fallback(Ipv4Addr::new(35, 190, 0, 1)).expect("gcp range");
        assert_eq!(location.confidence, 0.3);
        assert_eq!(location.country.as_deref(), Some("United States"));
    }

    #[test]
    fn test_pattern_fallback_unknown_range() {
        assert!(pattern_fallback(Ipv4Addr::new(93, 184, 216, 34)).is_none());
        // 170.x must not match the "17." prefix.
        assert!(pattern_fallback(Ipv4Addr::new(170, 1, 1, 1)).is_none());
    }
}
