//! HTTP response header inspection.
//!
//! One redirect-following GET against the domain, reading server
//! identification headers, Cloudflare edge metadata, and `Server-Timing`
//! round-trip measurements.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::config::HTTP_PROBE_TIMEOUT_SECS;
use crate::error_handling::{SignalResult, Unavailable};

/// Header-derived signals for a domain.
#[derive(Debug, Default, Clone)]
pub struct HeaderSignals {
    /// `Server` header value.
    pub server: Option<String>,
    /// `X-Powered-By` header value.
    pub powered_by: Option<String>,
    /// Full Cloudflare ray id.
    pub cf_ray: Option<String>,
    /// Edge location code extracted from the ray id.
    pub cf_ray_location: Option<String>,
    /// Cloudflare's own country determination for the client.
    pub cf_ipcountry: Option<String>,
    /// `rtt=` value from `Server-Timing`, in microseconds.
    pub server_rtt: Option<f64>,
    /// `min_rtt=` value from `Server-Timing`, in microseconds.
    pub server_min_rtt: Option<f64>,
    /// One-way distance guess in km derived from `min_rtt`, assuming ~2/3
    /// lightspeed fiber propagation. A rough heuristic, not a measurement.
    pub estimated_distance_km: Option<f64>,
}

/// Probes `https://{domain}/` and extracts header signals. The request
/// follows redirects and is bounded by the client's timeout.
pub async fn collect_header_signals(
    domain: &str,
    client: &reqwest::Client,
) -> SignalResult<HeaderSignals> {
    let url = format!("https://{domain}/");
    let response = client.get(&url).send().await.map_err(|e| {
        if e.is_timeout() {
            Unavailable::Timeout(Duration::from_secs(HTTP_PROBE_TIMEOUT_SECS))
        } else {
            Unavailable::Network(format!("header probe failed for {domain}: {e}"))
        }
    })?;

    let signals = signals_from_headers(response.headers());
    log::info!("found header signals for {domain}: {signals:?}");
    Ok(signals)
}

/// Builds the signal structure from a response header map.
fn signals_from_headers(headers: &HeaderMap) -> HeaderSignals {
    let mut signals = HeaderSignals {
        server: header_string(headers, "server"),
        powered_by: header_string(headers, "x-powered-by"),
        cf_ipcountry: header_string(headers, "cf-ipcountry"),
        ..HeaderSignals::default()
    };

    if let Some(cf_ray) = header_string(headers, "cf-ray") {
        signals.cf_ray_location = cf_ray_location(&cf_ray);
        signals.cf_ray = Some(cf_ray);
    }

    if let Some(timing) = header_string(headers, "server-timing") {
        let (rtt, min_rtt) = parse_server_timing(&timing);
        signals.server_rtt = rtt;
        signals.server_min_rtt = min_rtt;
        // Fiber carries light at roughly 2/3 c, ~200,000 km/s; halve the
        // round trip for a one-way distance.
        signals.estimated_distance_km = min_rtt.map(|us| (us / 1_000_000.0) * 200_000.0 / 2.0);
    }

    signals
}

/// Edge location code from a ray id: everything after the first hyphen
/// (`"7ac7-SJC"` gives `"SJC"`).
fn cf_ray_location(cf_ray: &str) -> Option<String> {
    cf_ray
        .split_once('-')
        .map(|(_, location)| location.to_string())
}

/// Pulls `rtt=` and `min_rtt=` values (microseconds) out of a Server-Timing
/// header such as `cfL4;desc="?proto=TCP&rtt=12345&min_rtt=9876"`.
fn parse_server_timing(value: &str) -> (Option<f64>, Option<f64>) {
    let mut rtt = None;
    let mut min_rtt = None;
    for token in value.split(|c: char| matches!(c, '&' | ';' | ',' | ' ' | '"' | '?')) {
        if let Some(v) = token.strip_prefix("min_rtt=") {
            min_rtt = min_rtt.or_else(|| v.parse().ok());
        } else if let Some(v) = token.strip_prefix("rtt=") {
            rtt = rtt.or_else(|| v.parse().ok());
        }
    }
    (rtt, min_rtt)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
