//! Narration script builder.
//!
//! Produces the text a TTS service reads out for a product reel, plus a
//! short tagline for titles and descriptions.

use reelwright_common::{NarrationConfig, NarrationSource};
use reelwright_model::ProductInfo;
use serde::{Deserialize, Serialize};

const REVIEWS_HEADING: &str = "Here's what customers are saying:";
const FEATURES_HEADING: &str = "Highlights:";
const ELLIPSIS: &str = "...";

/// Script text for one reel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrationScript {
    /// One-line hook.
    pub tagline: String,
    /// Full narration text, one sentence or bullet per line.
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Reviews,
    Features,
}

/// Build the narration script for a product.
pub fn build_script(product: &ProductInfo, config: &NarrationConfig) -> NarrationScript {
    let title = product.title.trim();
    let tagline = format!("Check out this find: {title}!");

    let mut lines = vec![format!("Check out {title} – it's a great find!")];

    if let Some(section) = pick_section(product, config.source) {
        lines.push(String::new());
        match section {
            Section::Reviews => {
                lines.push(REVIEWS_HEADING.to_string());
                lines.extend(
                    product
                        .reviews
                        .iter()
                        .map(|r| flatten(r))
                        .filter(|r| !r.is_empty())
                        .take(config.max_reviews)
                        .map(|r| format!("• {}", shorten(&r, config.snippet_chars))),
                );
            }
            Section::Features => {
                lines.push(FEATURES_HEADING.to_string());
                lines.extend(
                    product
                        .features
                        .iter()
                        .map(|f| flatten(f))
                        .filter(|f| !f.is_empty())
                        .map(|f| format!("• {f}")),
                );
            }
        }
    }

    if let Some(link) = product_link(product, config.affiliate_tag.as_deref()) {
        lines.push(String::new());
        lines.push(format!("Find it here: {link}"));
    }

    NarrationScript {
        tagline,
        body: lines.join("\n"),
    }
}

/// Affiliate link when both an ASIN and a tag are known, else the plain
/// product URL.
pub fn product_link(product: &ProductInfo, affiliate_tag: Option<&str>) -> Option<String> {
    let asin = product.asin.as_deref().map(str::trim).filter(|a| !a.is_empty());
    let tag = affiliate_tag.map(str::trim).filter(|t| !t.is_empty());
    match (asin, tag) {
        (Some(asin), Some(tag)) => Some(format!("https://www.amazon.com/dp/{asin}?tag={tag}")),
        _ => product
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
    }
}

fn pick_section(product: &ProductInfo, source: NarrationSource) -> Option<Section> {
    let has_reviews = product.reviews.iter().any(|r| !r.trim().is_empty());
    let has_features = product.features.iter().any(|f| !f.trim().is_empty());

    let pick = |wanted: bool, section: Section| wanted.then_some(section);
    match source {
        NarrationSource::ReviewsFirst => pick(has_reviews, Section::Reviews)
            .or_else(|| pick(has_features, Section::Features)),
        NarrationSource::FeaturesFirst => pick(has_features, Section::Features)
            .or_else(|| pick(has_reviews, Section::Reviews)),
        NarrationSource::ReviewsOnly => pick(has_reviews, Section::Reviews),
        NarrationSource::FeaturesOnly => pick(has_features, Section::Features),
    }
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `limit` characters, ending with an ellipsis when
/// shortened.
fn shorten(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> ProductInfo {
        ProductInfo {
            asin: Some("B0TEST1234".to_string()),
            title: "Desk Fan".to_string(),
            url: Some("https://example.com/fan".to_string()),
            reviews: vec!["Quiet and\nstrong.".to_string(), "Love it".to_string()],
            features: vec!["3 speeds".to_string()],
        }
    }

    #[test]
    fn test_reviews_first_with_affiliate_link() {
        let config = NarrationConfig {
            affiliate_tag: Some("reel-20".to_string()),
            ..NarrationConfig::default()
        };
        let script = build_script(&product(), &config);
        assert_eq!(script.tagline, "Check out this find: Desk Fan!");
        assert!(script.body.starts_with("Check out Desk Fan – it's a great find!"));
        assert!(script.body.contains(REVIEWS_HEADING));
        assert!(script.body.contains("• Quiet and strong."));
        assert!(!script.body.contains(FEATURES_HEADING));
        assert!(script
            .body
            .ends_with("Find it here: https://www.amazon.com/dp/B0TEST1234?tag=reel-20"));
    }

    #[test]
    fn test_falls_back_to_features_without_reviews() {
        let mut p = product();
        p.reviews.clear();
        let script = build_script(&p, &NarrationConfig::default());
        assert!(script.body.contains(FEATURES_HEADING));
        assert!(script.body.contains("• 3 speeds"));
        assert!(script.body.ends_with("Find it here: https://example.com/fan"));
    }

    #[test]
    fn test_only_sources_do_not_fall_back() {
        let mut p = product();
        p.features.clear();
        let config = NarrationConfig {
            source: NarrationSource::FeaturesOnly,
            ..NarrationConfig::default()
        };
        let script = build_script(&p, &config);
        assert!(!script.body.contains(REVIEWS_HEADING));
        assert!(!script.body.contains(FEATURES_HEADING));
    }

    #[test]
    fn test_long_review_shortened() {
        let mut p = product();
        p.reviews = vec!["x".repeat(250)];
        let script = build_script(&p, &NarrationConfig::default());
        let bullet = script
            .body
            .lines()
            .find(|l| l.starts_with("• "))
            .unwrap();
        let snippet = bullet.trim_start_matches("• ");
        assert_eq!(snippet.chars().count(), 200);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_max_reviews_respected() {
        let mut p = product();
        p.reviews = (0..6).map(|i| format!("review {i}")).collect();
        let script = build_script(&p, &NarrationConfig::default());
        assert_eq!(script.body.lines().filter(|l| l.starts_with("• ")).count(), 3);
    }

    #[test]
    fn test_no_link_without_url_or_tag() {
        let mut p = product();
        p.url = None;
        let script = build_script(&p, &NarrationConfig::default());
        assert!(!script.body.contains("Find it here"));
    }
}
