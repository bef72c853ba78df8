//! Social profile links and cross-platform handle equivalency.
//!
//! Link extraction walks page anchors looking for known platform domains.
//! The equivalency matcher then compares the trailing path segments
//! ("handles") across platforms: an organization that uses near-identical
//! handles everywhere is weak but real evidence that the profiles, and
//! whatever location data hangs off them, belong to the same entity.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// A social profile link discovered on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialLink {
    /// Platform name, e.g. `twitter`.
    pub platform: String,
    /// Absolute profile URL.
    pub url: String,
}

/// Cross-platform handle-similarity evidence.
#[derive(Debug, Clone)]
pub struct SocialEquivalency {
    /// Platform whose handle served as the comparison reference.
    pub reference_platform: String,
    /// The reference handle itself.
    pub reference_handle: String,
    /// Mean similarity across all compared handles, in `[0, 1]`.
    pub confidence: f64,
    /// Platforms whose handle cleared the similarity threshold.
    pub matching_platforms: BTreeSet<String>,
}

/// Platform name and the host substrings that identify it.
const SOCIAL_PLATFORMS: &[(&str, &[&str])] = &[
    ("twitter", &["twitter.com", "x.com"]),
    ("linkedin", &["linkedin.com"]),
    ("github", &["github.com"]),
    ("instagram", &["instagram.com"]),
    ("facebook", &["facebook.com", "fb.com"]),
    ("discord", &["discord.com", "discord.gg"]),
];

const HANDLE_PATTERN: &str = r"(?:com|net)/([^/]+)/?$";

/// Similarity above which two handles count as the same identity.
const SIMILARITY_THRESHOLD: f64 = 0.7;

static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(HANDLE_PATTERN).unwrap_or_else(|e| {
        panic!("failed to compile regex pattern in HANDLE_RE: {e}")
    })
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").unwrap_or_else(|e| {
        panic!("failed to parse ANCHOR_SELECTOR: {e}")
    })
});

/// Extracts one profile link per known platform from an HTML document, in
/// platform table order.
pub fn extract_social_links(document: &Html) -> Vec<SocialLink> {
    let mut links = Vec::new();

    for (platform, hosts) in SOCIAL_PLATFORMS {
        for element in document.select(&ANCHOR_SELECTOR) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href_lower = href.to_lowercase();
            if !hosts.iter().any(|host| href_lower.contains(host)) {
                continue;
            }
            let url = if href.starts_with("http://") || href.starts_with("https://") {
                href.to_string()
            } else if let Some(rest) = href.strip_prefix("//") {
                format!("https://{rest}")
            } else {
                format!("https://{}", href.trim_start_matches('/'))
            };
            links.push(SocialLink {
                platform: (*platform).to_string(),
                url,
            });
            break; // first link per platform
        }
    }

    if !links.is_empty() {
        log::info!(
            "found social links: {:?}",
            links.iter().map(|l| &l.platform).collect::<Vec<_>>()
        );
    }
    links
}

/// Compares handles across the given `(platform, url)` links.
///
/// The first platform with an extractable handle is the reference; every
/// other handle is scored against it. Returns `None` when no handle could be
/// extracted from any URL.
pub fn analyze_social_equivalency(links: &[SocialLink]) -> Option<SocialEquivalency> {
    let handles: Vec<(&str, String)> = links
        .iter()
        .filter_map(|link| {
            HANDLE_RE
                .captures(&link.url)
                .and_then(|caps| caps.get(1))
                .map(|m| (link.platform.as_str(), m.as_str().to_string()))
        })
        .collect();

    let (reference_platform, reference_handle) = handles.first()?;

    let mut matching_platforms = BTreeSet::new();
    let mut total_similarity = 0.0;
    for (platform, handle) in handles.iter().skip(1) {
        let similarity = strsim::jaro(reference_handle, handle);
        if similarity > SIMILARITY_THRESHOLD {
            matching_platforms.insert((*platform).to_string());
        }
        total_similarity += similarity;
    }

    // Mean over every extracted handle; the reference contributes zero, so a
    // lone profile scores 0.0 rather than a vacuous 1.0.
    let confidence = total_similarity / handles.len() as f64;

    Some(SocialEquivalency {
        reference_platform: reference_platform.to_string(),
        reference_handle: reference_handle.clone(),
        confidence,
        matching_platforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(platform: &str, url: &str) -> SocialLink {
        SocialLink {
            platform: platform.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_equivalency_similar_handles_match() {
        let links = [
            link("twitter", "https://twitter.com/acmecorp"),
            link("github", "https://github.com/acmecorp-inc"),
        ];
        let equivalency = analyze_social_equivalency(&links).expect("handles extracted");

        assert_eq!(equivalency.reference_platform, "twitter");
        assert_eq!(equivalency.reference_handle, "acmecorp");
        assert!(equivalency.matching_platforms.contains("github"));
        // jaro("acmecorp", "acmecorp-inc") is comfortably above 0.7.
        assert!(strsim::jaro("acmecorp", "acmecorp-inc") > 0.7);
    }

    #[test]
    fn test_equivalency_dissimilar_handles_do_not_match() {
        let links = [
            link("twitter", "https://twitter.com/acmecorp"),
            link("github", "https://github.com/zzqxv"),
        ];
        let equivalency = analyze_social_equivalency(&links).expect("handles extracted");
        assert!(equivalency.matching_platforms.is_empty());
        assert!(equivalency.confidence < 0.5);
    }

    #[test]
    fn test_equivalency_none_without_handles() {
        // linkedin company URLs have an extra path segment, so the trailing
        // handle regex cannot anchor on the host TLD.
        let links = [link("linkedin", "https://linkedin.com/company/acme/about")];
        assert!(analyze_social_equivalency(&links).is_none());
        assert!(analyze_social_equivalency(&[]).is_none());
    }

    #[test]
    fn test_equivalency_single_handle_scores_zero() {
        let links = [link("twitter", "https://twitter.com/acmecorp")];
        let equivalency = analyze_social_equivalency(&links).expect("handle extracted");
        assert_eq!(equivalency.confidence, 0.0);
        assert!(equivalency.matching_platforms.is_empty());
    }

    #[test]
    fn test_equivalency_confidence_is_mean_over_all_handles() {
        let links = [
            link("twitter", "https://twitter.com/acmecorp"),
            link("github", "https://github.com/acmecorp"),
        ];
        let equivalency = analyze_social_equivalency(&links).expect("handles extracted");
        // Identical handles: similarity 1.0, averaged over two entries.
        assert!((equivalency.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_extract_social_links_from_html() {
        let html = Html::parse_document(
            r#"<html><body>
                <a href="https://twitter.com/acmecorp">Twitter</a>
                <a href="/about">About</a>
                <a href="https://github.com/acmecorp">GitHub</a>
                <a href="https://github.com/acmecorp/repo">Repo</a>
            </body></html>"#,
        );
        let links = extract_social_links(&html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].platform, "twitter");
        assert_eq!(links[1].platform, "github");
        // First matching anchor per platform wins.
        assert_eq!(links[1].url, "https://github.com/acmecorp");
    }

    #[test]
    fn test_extract_social_links_protocol_relative() {
        let html = Html::parse_document(
            r#"<a href="//x.com/acmecorp">follow us</a>"#,
        );
        let links = extract_social_links(&html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://x.com/acmecorp");
    }

    #[test]
    fn test_extract_social_links_empty_document() {
        let html = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(extract_social_links(&html).is_empty());
    }

    #[test]
    fn test_handle_regex_trailing_slash() {
        let caps = HANDLE_RE.captures("https://twitter.com/acmecorp/").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "acmecorp");
    }
}
