//! IP geolocation against the acquired MaxMind databases.
//!
//! [`GeoIpService`] owns one optional reader per edition (city, country,
//! ASN). It is an explicitly constructed service with a single owner per
//! process; collectors that need it receive a reference. An edition that
//! could not be acquired degrades lookups, it never fails them.

mod lookup;
mod types;

pub use types::{IpFacts, IpLocation, LocationSource};

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use hickory_resolver::TokioAsyncResolver;
use maxminddb::Reader;

use crate::acquire::DatabaseAcquirer;

pub(crate) use lookup::CityFacts;

/// Resolves domains to IPs and queries the local GeoIP databases.
pub struct GeoIpService {
    resolver: Arc<TokioAsyncResolver>,
    city: Option<Reader<Vec<u8>>>,
    country: Option<Reader<Vec<u8>>>,
    asn: Option<Reader<Vec<u8>>>,
}

impl GeoIpService {
    /// Acquires every configured edition and opens a reader for each one
    /// that is available. Missing editions are logged and skipped.
    pub async fn initialize(
        acquirer: &DatabaseAcquirer,
        resolver: Arc<TokioAsyncResolver>,
    ) -> Self {
        let mut service = Self::without_databases(resolver);

        for (db, outcome) in acquirer.ensure_all().await {
            let path = match outcome {
                Ok(path) => path,
                Err(_) => continue, // already logged by the acquirer
            };
            let reader = match open_reader(&path) {
                Ok(reader) => reader,
                Err(e) => {
                    log::warn!("failed to open {}: {e:#}", db.edition_id);
                    continue;
                }
            };
            match edition_kind(&db.edition_id) {
                Some(EditionKind::City) => service.city = Some(reader),
                Some(EditionKind::Country) => service.country = Some(reader),
                Some(EditionKind::Asn) => service.asn = Some(reader),
                None => log::warn!("unrecognized edition {}, ignoring", db.edition_id),
            }
        }

        service
    }

    /// A service with no databases loaded. Lookups degrade to the IP-prefix
    /// heuristics; DNS resolution still works.
    pub fn without_databases(resolver: Arc<TokioAsyncResolver>) -> Self {
        Self {
            resolver,
            city: None,
            country: None,
            asn: None,
        }
    }

    /// True if at least one database edition is loaded.
    pub fn any_database_loaded(&self) -> bool {
        self.city.is_some() || self.country.is_some() || self.asn.is_some()
    }

    /// Resolves `domain` to its first IPv4 answer. DNS failure is a normal
    /// outcome, not an error.
    pub async fn resolve_ip(&self, domain: &str) -> Option<Ipv4Addr> {
        match self.resolver.ipv4_lookup(domain).await {
            Ok(answers) => answers.iter().next().map(|a| a.0),
            Err(e) => {
                log::warn!("failed to resolve {domain}: {e}");
                None
            }
        }
    }

    /// Resolves `domain` and produces scored IP-location evidence.
    ///
    /// Database facts are scored additively (+0.4 city, +0.2 country, +0.2
    /// ASN organization, +0.2 coordinates). When no database yields anything
    /// the hardcoded IP-prefix heuristics are the last resort; failing those,
    /// `None`.
    pub async fn resolve(&self, domain: &str) -> Option<IpLocation> {
        let ip = self.resolve_ip(domain).await?;
        let facts = self.query_databases(IpAddr::V4(ip));

        let has_any = facts.city.is_some()
            || facts.country.is_some()
            || facts.asn_org.is_some()
            || facts.latitude.is_some()
            || facts.longitude.is_some();
        if !has_any {
            let fallback = lookup::pattern_fallback(ip);
            if fallback.is_none() {
                log::warn!("no location data available for {domain} ({ip})");
            }
            return fallback;
        }

        let confidence = lookup::additive_confidence(
            facts.city.is_some(),
            facts.country.is_some(),
            facts.asn_org.is_some(),
            facts.latitude.is_some() && facts.longitude.is_some(),
        );
        log::info!("location confidence {confidence} for {domain} based on available data");

        Some(IpLocation {
            country: facts.country,
            city: facts.city,
            latitude: facts.latitude,
            longitude: facts.longitude,
            confidence,
            source: LocationSource::Maxmind,
        })
    }

    /// Resolves `domain` and returns the raw per-database facts, including a
    /// best-effort reverse-DNS hostname. `None` only when DNS resolution
    /// fails.
    pub async fn resolve_facts(&self, domain: &str) -> Option<IpFacts> {
        let ip = self.resolve_ip(domain).await?;
        let mut facts = self.query_databases(IpAddr::V4(ip));
        facts.ip = Some(ip.to_string());
        facts.hostname = self.reverse_hostname(IpAddr::V4(ip)).await;
        Some(facts)
    }

    /// City-level facts for an arbitrary IP (used to geolocate addresses
    /// embedded in TXT records).
    pub(crate) fn city_facts(&self, ip: IpAddr) -> Option<CityFacts> {
        self.city.as_ref().and_then(|reader| lookup::query_city(reader, ip))
    }

    async fn reverse_hostname(&self, ip: IpAddr) -> Option<String> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(names) => names.iter().next().map(|name| name.to_utf8()),
            Err(e) => {
                log::debug!("reverse lookup failed for {ip}: {e}");
                None
            }
        }
    }

    fn query_databases(&self, ip: IpAddr) -> IpFacts {
        let mut facts = IpFacts::default();

        if let Some(reader) = &self.city {
            if let Some(city) = lookup::query_city(reader, ip) {
                facts.country = city.country;
                facts.city = city.city;
                facts.region = city.region;
                facts.latitude = city.latitude;
                facts.longitude = city.longitude;
            } else {
                log::debug!("{ip} not found in city database");
            }
        }

        if let Some(reader) = &self.asn {
            if let Some((asn, asn_org)) = lookup::query_asn(reader, ip) {
                facts.asn = asn;
                facts.asn_org = asn_org;
            } else {
                log::debug!("{ip} not found in ASN database");
            }
        }

        // Country database is the narrower fallback when the city database
        // had no country for this address.
        if facts.country.is_none() {
            if let Some(reader) = &self.country {
                facts.country = lookup::query_country(reader, ip);
            }
        }

        facts
    }
}

fn open_reader(path: &std::path::Path) -> anyhow::Result<Reader<Vec<u8>>> {
    let bytes = std::fs::read(path)?;
    Ok(Reader::from_source(bytes)?)
}

enum EditionKind {
    City,
    Country,
    Asn,
}

/// Maps an edition id to the reader slot it fills, using the suffix after
/// the last hyphen (`GeoLite2-City` and `GeoIP2-City` both count as city).
fn edition_kind(edition_id: &str) -> Option<EditionKind> {
    let kind = edition_id.rsplit('-').next()?.to_ascii_lowercase();
    match kind.as_str() {
        "city" => Some(EditionKind::City),
        "country" => Some(EditionKind::Country),
        "asn" => Some(EditionKind::Asn),
        _ => None,
    }
}
