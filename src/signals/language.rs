//! Spelling-based language-region detection.

/// Relative share of US versus non-US spellings found in a text. The two
/// shares always sum to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRegion {
    /// Share of matched marker words that use US spellings.
    pub us: f64,
    /// Share of matched marker words that use non-US spellings.
    pub non_us: f64,
}

impl LanguageRegion {
    /// The dominant region label and its share. Ties go to `US`.
    pub fn dominant(&self) -> (&'static str, f64) {
        if self.us >= self.non_us {
            ("US", self.us)
        } else {
            ("Non-US", self.non_us)
        }
    }
}

const US_SPELLINGS: &[&str] = &[
    "color",
    "flavor",
    "center",
    "theater",
    "analyze",
    "customize",
    "honor",
];
const NON_US_SPELLINGS: &[&str] = &[
    "colour",
    "flavour",
    "centre",
    "theatre",
    "analyse",
    "customise",
    "honour",
];

/// Detects a likely region from spelling conventions.
///
/// Each marker word counts once regardless of how often it appears. Returns
/// `None` exactly when no marker from either set is present — weak evidence
/// is still evidence, but absence is not.
pub fn detect_language_region(text: &str) -> Option<LanguageRegion> {
    let lower = text.to_lowercase();
    let us = US_SPELLINGS.iter().filter(|w| lower.contains(*w)).count();
    let non_us = NON_US_SPELLINGS
        .iter()
        .filter(|w| lower.contains(*w))
        .count();

    let total = us + non_us;
    if total == 0 {
        log::debug!("no regional spelling patterns found");
        return None;
    }

    let region = LanguageRegion {
        us: us as f64 / total as f64,
        non_us: non_us as f64 / total as f64,
    };
    log::info!(
        "language region signals: US {:.2}, Non-US {:.2}",
        region.us,
        region.non_us
    );
    Some(region)
}
