//! DNS record harvesting.
//!
//! Issues A, AAAA, MX, TXT, and SOA queries independently; a failure on one
//! record type never aborts the others. TXT records are additionally mined
//! for `ip4:` tokens (SPF and friends), and each embedded IP is geolocated
//! best-effort through the city database.

use std::net::IpAddr;

use hickory_resolver::TokioAsyncResolver;

use crate::geoip::GeoIpService;

/// Location facts for an IP found inside a TXT record.
#[derive(Debug, Clone, Default)]
pub struct TxtIpLocation {
    /// City name.
    pub city: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
}

/// Everything the DNS collector could learn about a domain. Every field is
/// independently empty on lookup failure.
#[derive(Debug, Default)]
pub struct DnsSignals {
    /// IPv4 addresses.
    pub a_records: Vec<String>,
    /// IPv6 addresses.
    pub aaaa_records: Vec<String>,
    /// Mail exchangers, `"<preference> <host>"` per entry.
    pub mx_records: Vec<String>,
    /// Raw TXT record strings.
    pub txt_records: Vec<String>,
    /// IPs pulled out of `ip4:` tokens in TXT records.
    pub extracted_txt_ips: Vec<String>,
    /// Geolocation of extracted TXT IPs that parsed and resolved.
    pub txt_ip_locations: Vec<(String, TxtIpLocation)>,
    /// Primary nameserver from the SOA record.
    pub soa_primary: Option<String>,
    /// Responsible-party contact from the SOA record.
    pub soa_contact: Option<String>,
}

/// Collects DNS signals for `domain`. Best-effort: the returned structure is
/// as full as the queries allowed, and this function never fails.
pub async fn collect_dns_signals(
    domain: &str,
    resolver: &TokioAsyncResolver,
    geoip: &GeoIpService,
) -> DnsSignals {
    let mut signals = DnsSignals::default();

    match resolver.ipv4_lookup(domain).await {
        Ok(answers) => {
            signals.a_records = answers.iter().map(|a| a.0.to_string()).collect();
            log::info!("found A records for {domain}: {:?}", signals.a_records);
        }
        Err(e) => log::warn!("could not retrieve A records for {domain}: {e}"),
    }

    match resolver.ipv6_lookup(domain).await {
        Ok(answers) => {
            signals.aaaa_records = answers.iter().map(|a| a.0.to_string()).collect();
        }
        Err(e) => log::warn!("could not retrieve AAAA records for {domain}: {e}"),
    }

    match resolver.mx_lookup(domain).await {
        Ok(answers) => {
            signals.mx_records = answers
                .iter()
                .map(|mx| format!("{} {}", mx.preference(), mx.exchange().to_utf8()))
                .collect();
        }
        Err(e) => log::warn!("could not retrieve MX records for {domain}: {e}"),
    }

    match resolver.txt_lookup(domain).await {
        Ok(answers) => {
            signals.txt_records = answers
                .iter()
                .map(|txt| {
                    // TXT records can contain multiple strings - join them
                    txt.iter()
                        .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                        .collect::<Vec<String>>()
                        .join("")
                })
                .collect();

            for record in &signals.txt_records {
                signals
                    .extracted_txt_ips
                    .extend(extract_ip4_tokens(record));
            }
            for ip_text in signals.extracted_txt_ips.clone() {
                match ip_text.parse::<IpAddr>() {
                    Ok(ip) => {
                        if let Some(facts) = geoip.city_facts(ip) {
                            signals.txt_ip_locations.push((
                                ip_text,
                                TxtIpLocation {
                                    city: facts.city,
                                    country: facts.country,
                                    latitude: facts.latitude,
                                    longitude: facts.longitude,
                                },
                            ));
                        }
                    }
                    Err(_) => {
                        // SPF tokens may carry CIDR suffixes or hostnames;
                        // those are recorded but not geolocated.
                        log::debug!("could not geolocate TXT token {ip_text}");
                    }
                }
            }
        }
        Err(e) => log::warn!("could not retrieve TXT records for {domain}: {e}"),
    }

    match resolver.soa_lookup(domain).await {
        Ok(answers) => {
            if let Some(soa) = answers.iter().next() {
                // Primary nameserver and responsible-party mailbox, taken
                // as-is with no further validation.
                signals.soa_primary = Some(soa.mname().to_utf8());
                signals.soa_contact = Some(soa.rname().to_utf8());
            }
        }
        Err(e) => log::warn!("could not retrieve SOA record for {domain}: {e}"),
    }

    signals
}

/// Pulls the address token after each `ip4:` marker in a TXT record.
fn extract_ip4_tokens(record: &str) -> Vec<String> {
    record
        .split("ip4:")
        .skip(1)
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
