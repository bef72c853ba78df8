//! domain_origin: location inference for domains and URLs.
//!
//! Combines evidence from heterogeneous, individually unreliable sources —
//! MaxMind GeoIP databases, DNS records, TLS certificates, HTTP response
//! headers, page-language heuristics, regex-extracted postal addresses, and
//! cross-platform social-handle similarity — into one location estimate with
//! a calibrated confidence score.
//!
//! # Example
//!
//! ```no_run
//! use domain_origin::{Config, LocationInference};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = LocationInference::new(Config::from_env()).await?;
//! let estimate = service.lookup("https://example.com").await;
//! println!("{:?} (confidence {})", estimate.location, estimate.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! No single source is trusted alone: CDNs mask the true origin, certificates
//! can name the CDN rather than the operator, and language is weak evidence.
//! Collectors are independent and best-effort — each returns either data or a
//! typed "unavailable" marker, and no failure propagates past a collector
//! boundary. Callers always receive a well-formed [`LocationEstimate`].
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call from within an async context.

#![warn(missing_docs)]

pub mod acquire;
pub mod collectors;
pub mod config;
pub mod engine;
pub mod error_handling;
pub mod fusion;
pub mod geoip;
pub mod initialization;
pub mod object_cache;
pub mod signals;

// Re-export the public API surface
pub use config::{Config, LogFormat, LogLevel};
pub use engine::{DomainFacts, LocationInference, SecondarySignals};
pub use error_handling::{SignalResult, Unavailable};
pub use fusion::{combine_signals, LocationEstimate, SignalContribution};
pub use geoip::{GeoIpService, IpLocation, LocationSource};
