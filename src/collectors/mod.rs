//! Secondary signal collectors.
//!
//! Independent, best-effort probes for evidence beyond IP geolocation: DNS
//! records, the TLS certificate, and HTTP response headers. Each collector
//! bounds its network calls and absorbs its own failures; they are only run
//! when the resolved address belongs to a known CDN, where direct IP
//! geolocation points at an edge node instead of the origin.

mod cdn;
mod dns;
mod headers;
mod tls;

pub use cdn::cdn_provider;
pub use dns::{collect_dns_signals, DnsSignals, TxtIpLocation};
pub use headers::{collect_header_signals, HeaderSignals};
pub use tls::{collect_certificate_signals, CertificateSignals};
