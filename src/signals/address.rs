//! Postal address extraction.
//!
//! Two regex families applied independently: US street addresses (street
//! suffix, two-letter state code, 5/9-digit ZIP) and non-US addresses
//! (street suffix with a UK-style postcode). Matches are not deduplicated or
//! cross-validated; every match carries the same fixed confidence.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Classification of an extracted address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionClass {
    /// Matched the US address pattern.
    Us,
    /// Matched the non-US address pattern.
    NonUs,
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionClass::Us => f.write_str("US"),
            RegionClass::NonUs => f.write_str("Non-US"),
        }
    }
}

/// One candidate postal address found in page text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressMatch {
    /// The matched address text.
    pub text: String,
    /// Fixed pattern confidence.
    pub confidence: f64,
    /// Which pattern family matched.
    pub region: RegionClass,
}

/// Confidence assigned to every regex match.
const ADDRESS_CONFIDENCE: f64 = 0.9;

const US_ADDRESS_PATTERN: &str = r"(?i)\b\d+\s+[A-Za-z\s,]+(?:Road|Street|Ave|Avenue|Blvd|Boulevard|Rd|St|Dr|Drive|Lane|Ln|Place|Pl|Circle|Cir|Court|Ct|Highway|Hwy|Way)[,\s]+(?:[A-Za-z\s]+,\s*)?(?:AL|AK|AZ|AR|CA|CO|CT|DE|FL|GA|HI|ID|IL|IN|IA|KS|KY|LA|ME|MD|MA|MI|MN|MS|MO|MT|NE|NV|NH|NJ|NM|NY|NC|ND|OH|OK|OR|PA|RI|SC|SD|TN|TX|UT|VT|VA|WA|WV|WI|WY)[,\s]+\d{5}(?:-\d{4})?\b";

const NON_US_ADDRESS_PATTERN: &str = r"(?i)\b\d+\s+[A-Za-z\s,]+(?:Road|Street|Avenue|Lane|Court|Way|Close|Drive|Park|Gardens|Grove|Terrace)[,\s]+(?:[A-Za-z\s]+,\s*)?[A-Z]{1,2}[0-9][0-9A-Z]?\s+[0-9][A-Z]{2}\b";

static US_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(US_ADDRESS_PATTERN, "US_ADDRESS_RE"));
static NON_US_ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_pattern(NON_US_ADDRESS_PATTERN, "NON_US_ADDRESS_RE"));

/// Compiles a static pattern, panicking with context on failure. The
/// patterns are compile-time constants, so a failure is a programming error.
fn compile_pattern(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("failed to compile regex pattern in {context}: {e}"))
}

/// Extracts candidate postal addresses from `text`.
///
/// US matches come first, then non-US matches, each in document order, so
/// repeated runs over the same text yield identical results.
pub fn extract_addresses(text: &str) -> Vec<AddressMatch> {
    let mut addresses = Vec::new();

    for m in US_ADDRESS_RE.find_iter(text) {
        addresses.push(AddressMatch {
            text: m.as_str().to_string(),
            confidence: ADDRESS_CONFIDENCE,
            region: RegionClass::Us,
        });
    }
    for m in NON_US_ADDRESS_RE.find_iter(text) {
        addresses.push(AddressMatch {
            text: m.as_str().to_string(),
            confidence: ADDRESS_CONFIDENCE,
            region: RegionClass::NonUs,
        });
    }

    if !addresses.is_empty() {
        log::info!("extracted {} candidate addresses", addresses.len());
    }
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_address_with_zip() {
        let text = "Visit us at 350 Fifth Avenue, New York, NY 10118 for a tour.";
        let addresses = extract_addresses(text);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].region, RegionClass::Us);
        assert_eq!(addresses[0].confidence, 0.9);
        assert!(addresses[0].text.contains("NY 10118"));
    }

    #[test]
    fn test_us_address_with_zip_plus_four() {
        let text = "Mail: 1600 Pennsylvania Avenue, Washington, DC 20500-0005";
        // DC is not in the state list, so this must not match.
        assert!(extract_addresses(text).is_empty());

        let text = "Mail: 123 Main Street, Springfield, IL 62704-1234";
        let addresses = extract_addresses(text);
        assert_eq!(addresses.len(), 1);
        assert!(addresses[0].text.ends_with("62704-1234"));
    }

    #[test]
    fn test_non_us_address_with_postcode() {
        let text = "Our office: 221 Baker Street, London, NW1 6XE";
        let addresses = extract_addresses(text);
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].region, RegionClass::NonUs);
    }

    #[test]
    fn test_extraction_is_idempotent_and_ordered() {
        let text = "HQ at 42 Elm Street, Portland, OR 97205. \
                    UK branch at 7 Rose Gardens, Leeds, LS1 4AB.";
        let first = extract_addresses(text);
        let second = extract_addresses(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        // US family is applied before the non-US family.
        assert_eq!(first[0].region, RegionClass::Us);
        assert_eq!(first[1].region, RegionClass::NonUs);
    }

    #[test]
    fn test_no_addresses() {
        assert!(extract_addresses("no addresses in this text").is_empty());
    }

    #[test]
    fn test_region_class_display() {
        assert_eq!(RegionClass::Us.to_string(), "US");
        assert_eq!(RegionClass::NonUs.to_string(), "Non-US");
    }
}
