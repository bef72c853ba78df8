//! Weighted combination of location signals.
//!
//! Every available signal class contributes `class_confidence * class_weight`
//! to the overall confidence. The weights are fixed and sum to 1.0, so the
//! result cannot exceed 1.0 by construction. Location selection is a
//! deterministic precedence over the same inputs. Fusion is a pure function
//! of its arguments and cannot fail; the zero-confidence error shape is
//! produced by the lookup entry point when it cannot even derive a host.

use serde::Serialize;

use crate::geoip::IpLocation;
use crate::signals::{AddressMatch, LanguageRegion, SocialEquivalency};

/// Weight of IP geolocation evidence.
pub const IP_GEOLOCATION_WEIGHT: f64 = 0.25;
/// Weight of spelling-based language evidence.
pub const LANGUAGE_WEIGHT: f64 = 0.10;
/// Weight of extracted postal addresses.
pub const ADDRESS_WEIGHT: f64 = 0.30;
/// Weight reserved for location mentions in page content. No collector
/// populates this class; the slot keeps the weights summing to 1.0.
pub const CONTENT_MENTION_WEIGHT: f64 = 0.25;
/// Weight of cross-platform social-handle equivalency.
pub const SOCIAL_EQUIVALENCY_WEIGHT: f64 = 0.10;

/// One signal class's weighted contribution to the final confidence.
#[derive(Debug, Clone, Serialize)]
pub struct SignalContribution {
    /// Signal class name.
    pub name: &'static str,
    /// `class_confidence * class_weight` for this class.
    pub weighted_score: f64,
}

/// The fused location estimate returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct LocationEstimate {
    /// Best location text, per the selection precedence, if any signal
    /// produced one.
    pub location: Option<String>,
    /// Weight-normalized confidence in `[0, 1]`, rounded to two decimals.
    pub confidence: f64,
    /// Per-class weighted scores, in processing order.
    pub contributing_signals: Vec<SignalContribution>,
    /// Human-readable labels of the signals that contributed.
    pub signals_used: Vec<String>,
    /// Set when the lookup failed before fusion could run.
    pub error: Option<String>,
}

impl LocationEstimate {
    /// Zero-confidence estimate carrying an error message.
    pub(crate) fn failed(error: String) -> Self {
        Self {
            location: None,
            confidence: 0.0,
            contributing_signals: Vec::new(),
            signals_used: Vec::new(),
            error: Some(error),
        }
    }
}

/// Combines the available signal classes into one estimate.
///
/// `content_mentions` is accepted for the reserved weight slot but no
/// current extractor produces it.
pub fn combine_signals(
    ip_location: Option<&IpLocation>,
    language: Option<&LanguageRegion>,
    addresses: &[AddressMatch],
    content_mentions: Option<&str>,
    social: Option<&SocialEquivalency>,
) -> LocationEstimate {
    let mut confidence = 0.0;
    let mut contributing_signals = Vec::new();
    let mut signals_used = Vec::new();

    if let Some(ip) = ip_location {
        let weighted_score = ip.confidence * IP_GEOLOCATION_WEIGHT;
        contributing_signals.push(SignalContribution {
            name: "ip",
            weighted_score,
        });
        confidence += weighted_score;
        signals_used.push(format!("IP Geolocation ({})", ip.source));
    }

    if let Some(language) = language {
        let (region, share) = language.dominant();
        let weighted_score = share * LANGUAGE_WEIGHT;
        contributing_signals.push(SignalContribution {
            name: "language",
            weighted_score,
        });
        confidence += weighted_score;
        signals_used.push(format!("Language Analysis ({region})"));
    }

    if !addresses.is_empty() {
        let strongest = addresses
            .iter()
            .map(|address| address.confidence)
            .fold(0.0, f64::max);
        let weighted_score = strongest * ADDRESS_WEIGHT;
        contributing_signals.push(SignalContribution {
            name: "addresses",
            weighted_score,
        });
        confidence += weighted_score;
        signals_used.push("Address Extraction".to_string());
    }

    // The content-mentions class keeps its weight slot but has no producer.
    let _ = content_mentions;

    if let Some(social) = social {
        let weighted_score = social.confidence * SOCIAL_EQUIVALENCY_WEIGHT;
        contributing_signals.push(SignalContribution {
            name: "social",
            weighted_score,
        });
        confidence += weighted_score;
        signals_used.push(format!(
            "Social Handle Equivalency ({})",
            social.reference_platform
        ));
    }

    let location = if let Some(first) = addresses.first() {
        Some(first.text.clone())
    } else if let Some(city) = ip_location.and_then(|ip| ip.city.as_deref()) {
        let country = ip_location
            .and_then(|ip| ip.country.as_deref())
            .unwrap_or("Unknown");
        Some(format!("{city}, {country}"))
    } else if let Some(language) = language {
        let (region, _) = language.dominant();
        Some(format!("Likely {region} based on language patterns"))
    } else {
        None
    };

    LocationEstimate {
        location,
        confidence: (confidence * 100.0).round() / 100.0,
        contributing_signals,
        signals_used,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::LocationSource;
    use crate::signals::RegionClass;

    fn ip_location(city: Option<&str>, country: Option<&str>, confidence: f64) -> IpLocation {
        IpLocation {
            country: country.map(str::to_string),
            city: city.map(str::to_string),
            latitude: None,
            longitude: None,
            confidence,
            source: LocationSource::Maxmind,
        }
    }

    fn address(text: &str) -> AddressMatch {
        AddressMatch {
            text: text.to_string(),
            confidence: 0.9,
            region: RegionClass::Us,
        }
    }

    #[test]
    fn test_no_signals_yields_empty_estimate() {
        let estimate = combine_signals(None, None, &[], None, None);
        assert_eq!(estimate.confidence, 0.0);
        assert!(estimate.location.is_none());
        assert!(estimate.contributing_signals.is_empty());
        assert!(estimate.signals_used.is_empty());
        assert!(estimate.error.is_none());
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = IP_GEOLOCATION_WEIGHT
            + LANGUAGE_WEIGHT
            + ADDRESS_WEIGHT
            + CONTENT_MENTION_WEIGHT
            + SOCIAL_EQUIVALENCY_WEIGHT;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_rounded_weighted_sum() {
        let ip = ip_location(Some("Springfield"), Some("United States"), 1.0);
        let language = LanguageRegion { us: 1.0, non_us: 0.0 };
        let addresses = vec![address("42 Elm Street, Portland, OR 97205")];

        let estimate = combine_signals(Some(&ip), Some(&language), &addresses, None, None);
        // 1.0*0.25 + 1.0*0.10 + 0.9*0.30 = 0.62
        assert_eq!(estimate.confidence, 0.62);
        assert_eq!(estimate.contributing_signals.len(), 3);
        assert!(estimate.confidence <= 1.0);
    }

    #[test]
    fn test_full_signal_set_stays_within_unit_interval() {
        let ip = ip_location(Some("Springfield"), Some("United States"), 1.0);
        let language = LanguageRegion { us: 1.0, non_us: 0.0 };
        let addresses = vec![address("42 Elm Street, Portland, OR 97205")];
        let social = SocialEquivalency {
            reference_platform: "twitter".to_string(),
            reference_handle: "acmecorp".to_string(),
            confidence: 1.0,
            matching_platforms: std::collections::BTreeSet::new(),
        };

        let estimate =
            combine_signals(Some(&ip), Some(&language), &addresses, None, Some(&social));
        assert!(estimate.confidence <= 1.0);
        assert_eq!(estimate.signals_used.len(), 4);
    }

    #[test]
    fn test_location_precedence_address_first() {
        let ip = ip_location(Some("Springfield"), Some("United States"), 1.0);
        let addresses = vec![
            address("42 Elm Street, Portland, OR 97205"),
            address("9 Oak Avenue, Austin, TX 78701"),
        ];
        let estimate = combine_signals(Some(&ip), None, &addresses, None, None);
        assert_eq!(
            estimate.location.as_deref(),
            Some("42 Elm Street, Portland, OR 97205")
        );
    }

    #[test]
    fn test_location_precedence_ip_city() {
        let ip = ip_location(Some("Springfield"), Some("United States"), 0.8);
        let estimate = combine_signals(Some(&ip), None, &[], None, None);
        assert_eq!(
            estimate.location.as_deref(),
            Some("Springfield, United States")
        );
    }

    #[test]
    fn test_location_precedence_skips_cityless_ip() {
        let ip = ip_location(None, Some("United States"), 0.4);
        let language = LanguageRegion { us: 0.0, non_us: 1.0 };
        let estimate = combine_signals(Some(&ip), Some(&language), &[], None, None);
        assert_eq!(
            estimate.location.as_deref(),
            Some("Likely Non-US based on language patterns")
        );
    }

    #[test]
    fn test_language_only_estimate() {
        let language = LanguageRegion { us: 0.0, non_us: 1.0 };
        let estimate = combine_signals(None, Some(&language), &[], None, None);
        assert_eq!(estimate.confidence, 0.1);
        assert_eq!(estimate.signals_used, vec!["Language Analysis (Non-US)"]);
    }

    #[test]
    fn test_social_contributes_confidence_but_not_location() {
        let social = SocialEquivalency {
            reference_platform: "twitter".to_string(),
            reference_handle: "acmecorp".to_string(),
            confidence: 0.8,
            matching_platforms: std::collections::BTreeSet::new(),
        };
        let estimate = combine_signals(None, None, &[], None, Some(&social));
        assert_eq!(estimate.confidence, 0.08);
        assert!(estimate.location.is_none());
        assert_eq!(estimate.contributing_signals[0].name, "social");
    }

    #[test]
    fn test_ip_pattern_source_label() {
        let ip = IpLocation {
            country: Some("United States".to_string()),
            city: None,
            latitude: None,
            longitude: None,
            confidence: 0.4,
            source: LocationSource::IpPattern,
        };
        let estimate = combine_signals(Some(&ip), None, &[], None, None);
        assert_eq!(estimate.signals_used, vec!["IP Geolocation (ip_pattern)"]);
        assert_eq!(estimate.confidence, 0.1);
    }
}
