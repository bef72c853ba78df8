//! Known CDN operators by autonomous system number.
//!
//! Static data, not logic: the table can be updated without touching
//! detection or fusion. Secondary collectors only run for addresses on these
//! networks, where direct IP geolocation points at an edge node rather than
//! the origin.

/// `(ASN, provider)` pairs for networks operated by content delivery
/// networks.
const CDN_ASNS: &[(u32, &str)] = &[
    (13335, "Cloudflare"),
    (15169, "Google Cloud CDN"),
    (16509, "Amazon CloudFront"),
    (20940, "Akamai"),
    (54113, "Fastly"),
];

/// Returns the CDN provider operating `asn`, if any.
pub fn cdn_provider(asn: u32) -> Option<&'static str> {
    CDN_ASNS
        .iter()
        .find(|(candidate, _)| *candidate == asn)
        .map(|(_, provider)| *provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloudflare_asn_is_cdn() {
        assert_eq!(cdn_provider(13335), Some("Cloudflare"));
    }

    #[test]
    fn test_all_known_providers_resolve() {
        assert_eq!(cdn_provider(16509), Some("Amazon CloudFront"));
        assert_eq!(cdn_provider(20940), Some("Akamai"));
        assert_eq!(cdn_provider(54113), Some("Fastly"));
        assert_eq!(cdn_provider(15169), Some("Google Cloud CDN"));
    }

    #[test]
    fn test_arbitrary_asn_is_not_cdn() {
        assert_eq!(cdn_provider(64512), None);
        assert_eq!(cdn_provider(0), None);
    }
}
