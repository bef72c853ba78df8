//! Text-derived signal extractors.
//!
//! Pure functions over page text and extracted links: spelling-based
//! language-region detection, postal address extraction, and social-handle
//! equivalency.

mod address;
mod language;
mod social;

pub use address::{extract_addresses, AddressMatch, RegionClass};
pub use language::{detect_language_region, LanguageRegion};
pub use social::{
    analyze_social_equivalency, extract_social_links, SocialEquivalency, SocialLink,
};
