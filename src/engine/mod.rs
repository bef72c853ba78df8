//! The lookup service.
//!
//! [`LocationInference`] wires the resolver, HTTP client, database acquirer,
//! and GeoIP service together and exposes the two public entry points:
//! [`LocationInference::lookup`] for a fused estimate and
//! [`LocationInference::lookup_url`] for raw per-source facts.
//!
//! Collectors that are independent run concurrently; fusion is a pure read
//! of their outputs. Secondary collectors (DNS, TLS, headers) only run when
//! the resolved ASN belongs to a known CDN.

use std::sync::Arc;

use hickory_resolver::TokioAsyncResolver;
use scraper::Html;
use url::Url;

use crate::acquire::DatabaseAcquirer;
use crate::collectors::{
    cdn_provider, collect_certificate_signals, collect_dns_signals, collect_header_signals,
    CertificateSignals, DnsSignals, HeaderSignals,
};
use crate::config::{Config, MAX_RESPONSE_BODY_SIZE, MAX_TEXT_EXTRACTION_CHARS};
use crate::error_handling::{InitializationError, SignalResult};
use crate::fusion::{combine_signals, LocationEstimate};
use crate::geoip::GeoIpService;
use crate::signals::{
    analyze_social_equivalency, detect_language_region, extract_addresses, extract_social_links,
};
use crate::{initialization, object_cache};

/// Secondary evidence gathered when the resolved IP belongs to a CDN.
#[derive(Debug)]
pub struct SecondarySignals {
    /// DNS record harvest.
    pub dns: DnsSignals,
    /// TLS certificate fields.
    pub certificate: CertificateSignals,
    /// HTTP header probe, or why it was unavailable.
    pub headers: SignalResult<HeaderSignals>,
}

/// Raw per-source facts for a domain, before fusion.
#[derive(Debug)]
pub struct DomainFacts {
    /// The domain the facts describe.
    pub domain: String,
    /// Resolved IPv4 address.
    pub ip: Option<String>,
    /// Reverse-DNS hostname of the resolved address.
    pub hostname: Option<String>,
    /// City name from the city database.
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
    /// Whether the ASN belongs to a known CDN operator.
    pub is_cdn: bool,
    /// The CDN operator, when detected.
    pub cdn_provider: Option<&'static str>,
    /// Secondary signal bundle; populated only behind a CDN.
    pub additional_signals: Option<SecondarySignals>,
}

/// Location inference service. One explicitly constructed instance per
/// process; no hidden global state.
pub struct LocationInference {
    resolver: Arc<TokioAsyncResolver>,
    client: reqwest::Client,
    geoip: GeoIpService,
}

impl LocationInference {
    /// Builds the service from configuration.
    ///
    /// Database acquisition runs here, once; editions that cannot be
    /// acquired degrade the corresponding evidence but never fail
    /// construction.
    pub async fn new(config: Config) -> Result<Self, InitializationError> {
        let resolver = initialization::init_resolver();
        let client = initialization::init_client(&config)?;
        let cache = object_cache::from_config(&config);
        let acquirer = DatabaseAcquirer::new(&config, cache);
        let geoip = GeoIpService::initialize(&acquirer, Arc::clone(&resolver)).await;
        Ok(Self::from_parts(resolver, client, geoip))
    }

    /// Assembles a service from already-built parts. Useful for tests and
    /// for callers that manage acquisition themselves.
    pub fn from_parts(
        resolver: Arc<TokioAsyncResolver>,
        client: reqwest::Client,
        geoip: GeoIpService,
    ) -> Self {
        Self {
            resolver,
            client,
            geoip,
        }
    }

    /// Resolves a URL or bare domain to a fused location estimate.
    ///
    /// Always returns a well-formed estimate: an unusable input yields a
    /// zero-confidence estimate with `error` set, never a panic or an Err.
    pub async fn lookup(&self, url_or_domain: &str) -> LocationEstimate {
        let Some(domain) = normalize_domain(url_or_domain) else {
            log::error!("could not parse domain from {url_or_domain:?}");
            return LocationEstimate::failed(format!(
                "could not parse a host from {url_or_domain:?}"
            ));
        };

        // IP resolution and the page fetch are independent; run them
        // together.
        let (ip_location, page) =
            tokio::join!(self.geoip.resolve(&domain), self.fetch_page(&domain));

        let (language, addresses, social) = match page {
            Some(body) => {
                let document = Html::parse_document(&body);
                let text = extract_page_text(&document);
                let links = extract_social_links(&document);
                (
                    detect_language_region(&text),
                    extract_addresses(&text),
                    analyze_social_equivalency(&links),
                )
            }
            None => (None, Vec::new(), None),
        };

        let estimate = combine_signals(
            ip_location.as_ref(),
            language.as_ref(),
            &addresses,
            None,
            social.as_ref(),
        );
        log::info!(
            "final estimate for {domain}: location {:?}, confidence {}",
            estimate.location,
            estimate.confidence
        );
        estimate
    }

    /// Resolves a URL or bare domain to raw per-source facts plus CDN
    /// detection. When the ASN belongs to a known CDN, the secondary
    /// collectors run concurrently and their bundle is attached.
    ///
    /// Returns `None` when no domain can be parsed or DNS resolution fails.
    pub async fn lookup_url(&self, url_or_domain: &str) -> Option<DomainFacts> {
        let domain = normalize_domain(url_or_domain).or_else(|| {
            log::error!("could not parse domain from {url_or_domain:?}");
            None
        })?;

        let raw = self.geoip.resolve_facts(&domain).await?;
        let provider = raw.asn.and_then(cdn_provider);

        let additional_signals = if let Some(provider) = provider {
            log::info!("detected CDN {provider} for {domain}; collecting secondary signals");
            Some(self.collect_secondary(&domain).await)
        } else {
            None
        };

        Some(DomainFacts {
            domain,
            ip: raw.ip,
            hostname: raw.hostname,
            city: raw.city,
            region: raw.region,
            country: raw.country,
            latitude: raw.latitude,
            longitude: raw.longitude,
            asn: raw.asn,
            asn_org: raw.asn_org,
            is_cdn: provider.is_some(),
            cdn_provider: provider,
            additional_signals,
        })
    }

    /// Runs the three secondary collectors concurrently. Each absorbs its
    /// own failures; the join itself cannot fail.
    async fn collect_secondary(&self, domain: &str) -> SecondarySignals {
        let (dns, certificate, headers) = tokio::join!(
            collect_dns_signals(domain, &self.resolver, &self.geoip),
            collect_certificate_signals(domain),
            collect_header_signals(domain, &self.client),
        );
        SecondarySignals {
            dns,
            certificate,
            headers,
        }
    }

    /// Fetches the domain's landing page for the text extractors.
    /// Best-effort with a body size cap; failure means text signals are
    /// simply absent.
    async fn fetch_page(&self, domain: &str) -> Option<String> {
        let url = format!("https://{domain}/");
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("page fetch failed for {domain}: {e}");
                return None;
            }
        };

        if let Some(length) = response.content_length() {
            if length > MAX_RESPONSE_BODY_SIZE as u64 {
                log::warn!("page body too large for {domain} ({length} bytes), skipping");
                return None;
            }
        }

        match response.text().await {
            Ok(mut body) => {
                if body.len() > MAX_RESPONSE_BODY_SIZE {
                    truncate_at_boundary(&mut body, MAX_RESPONSE_BODY_SIZE);
                }
                Some(body)
            }
            Err(e) => {
                log::warn!("failed to read page body for {domain}: {e}");
                None
            }
        }
    }
}

/// Extracts a lookup host from a URL or bare domain.
pub(crate) fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let parsed = Url::parse(&candidate).ok()?;
    parsed.host_str().map(str::to_string)
}

/// Concatenates the document's text nodes, bounded to keep extraction cheap
/// on very large pages.
fn extract_page_text(document: &Html) -> String {
    let mut text = String::new();
    for piece in document.root_element().text() {
        if text.len() >= MAX_TEXT_EXTRACTION_CHARS {
            break;
        }
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        text.push_str(piece);
        text.push(' ');
    }
    text
}

/// Truncates a string to at most `max` bytes without splitting a UTF-8
/// character.
fn truncate_at_boundary(s: &mut String, max: usize) {
    let mut end = max.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_from_url() {
        assert_eq!(
            normalize_domain("https://www.example.com/path?q=1").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(
            normalize_domain("http://example.com").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn test_normalize_domain_from_bare_host() {
        assert_eq!(
            normalize_domain("example.com").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            normalize_domain("  example.com  ").as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn test_normalize_domain_rejects_garbage() {
        assert!(normalize_domain("").is_none());
        assert!(normalize_domain("   ").is_none());
        assert!(normalize_domain("http://").is_none());
    }

    #[test]
    fn test_extract_page_text_collects_text_nodes() {
        let document = Html::parse_document(
            "<html><body><h1>Acme Corp</h1><p>The colour of quality.</p></body></html>",
        );
        let text = extract_page_text(&document);
        assert!(text.contains("Acme Corp"));
        assert!(text.contains("colour"));
    }

    #[test]
    fn test_truncate_at_boundary_multibyte() {
        let mut s = "héllo wörld".to_string();
        truncate_at_boundary(&mut s, 3);
        // Never splits the two-byte 'é'.
        assert!(s.is_char_boundary(s.len()));
        assert!(s.len() <= 3);
    }

    #[tokio::test]
    async fn test_lookup_unparseable_input_returns_error_estimate() {
        let resolver = initialization::init_resolver();
        let client = reqwest::Client::new();
        let geoip = GeoIpService::without_databases(Arc::clone(&resolver));
        let service = LocationInference::from_parts(resolver, client, geoip);

        let estimate = service.lookup("   ").await;
        assert_eq!(estimate.confidence, 0.0);
        assert!(estimate.location.is_none());
        assert!(estimate.error.is_some());
    }
}
