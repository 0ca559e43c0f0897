//! Card number extraction and normalization.
//!
//! Numbers come from three places, tried in order of reliability: the card
//! URL slug, number-bearing containers in the card page, and finally a broad
//! scan of labeled text nodes. All digits are normalized to a three-digit
//! zero-padded form so progress identities and filenames stay stable across
//! sources that render "7", "07", and "007" for the same card.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::parse_selector;

/// Slug patterns tried in order against the last URL path segment. The
/// `Card-<n>` form only counts when it ends the slug; an interior
/// `-Card-<n>-` fragment falls through to the looser patterns.
static SLUG_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Card[-_](\d+)$",
        r"[-_](\d+)$",
        r"#(\d+)",
        r"(?:No\.?|#)?\s*(\d+)$",
        r"\b(\d{1,3})\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Matches a card number in page text, tolerating "#7", "No. 7", and the
/// "7/102" numerator form.
static PAGE_NUMBER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:#|No\.?\s*)?(\d+)(?:\s*/\s*\d+)?").ok());

/// Containers that commonly hold the card number, most specific first.
static NUMBER_CONTAINER_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".card-number",
        ".card-num",
        ".card-info-number",
        ".card-details-number",
        ".card-data-number",
        ".card-meta-number",
        ".card-header-number",
        ".card-footer-number",
        ".number",
        ".card-info",
        ".card-details",
    ]
    .iter()
    .map(|css| parse_selector(css))
    .collect()
});

/// Broad tag scan used as the last resort, filtered by label text.
static LABELED_TEXT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector("span, div, td, li, p, th"));

/// Data attributes that may carry the number directly.
const NUMBER_DATA_ATTRS: [&str; 3] = ["data-number", "data-card-number", "data-num"];

/// Label substrings that mark a text node as number-bearing.
const NUMBER_LABELS: [&str; 5] = ["Card Number", "Card No", "Number", "No.", "#"];

/// Extracts a card number from the final path segment of a card URL.
///
/// Tries each slug pattern in order; e.g. `Pikachu-Card-7` yields `"7"`.
#[must_use]
pub fn number_from_slug(card_url: &str) -> Option<String> {
    let slug = card_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .split('?')
        .next()?;

    for pattern in SLUG_NUMBER_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(slug) {
            if let Some(digits) = captures.get(1) {
                return Some(digits.as_str().to_string());
            }
        }
    }
    None
}

/// Extracts a card number from a parsed card detail page.
///
/// Checks known number containers first (text and data attributes), then
/// falls back to scanning common text elements for a labeled number.
#[must_use]
pub fn number_from_document(document: &Html) -> Option<String> {
    for selector in NUMBER_CONTAINER_SELECTORS.iter() {
        for element in document.select(selector) {
            for attr in NUMBER_DATA_ATTRS {
                if let Some(value) = element.value().attr(attr) {
                    if let Some(digits) = first_number_in(value) {
                        return Some(digits);
                    }
                }
            }
            let text: String = element.text().collect();
            if let Some(digits) = first_number_in(&text) {
                return Some(digits);
            }
        }
    }

    // Last resort: any short text node that looks like a labeled number.
    for element in document.select(&LABELED_TEXT_SELECTOR) {
        let text: String = element.text().collect();
        let trimmed = text.trim();
        if trimmed.len() > 64 {
            continue;
        }
        if NUMBER_LABELS.iter().any(|label| trimmed.contains(label)) {
            if let Some(digits) = first_number_in(trimmed) {
                return Some(digits);
            }
        }
    }
    None
}

/// Pulls the first number out of a text snippet, preferring the numerator of
/// a "7/102" style fraction.
fn first_number_in(text: &str) -> Option<String> {
    let re = PAGE_NUMBER_RE.as_ref()?;
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalizes a raw number to the canonical three-digit form.
///
/// Leading zeros are stripped first so `"007"` and `"7"` normalize
/// identically; an all-zero input becomes `"000"`.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    format!("{digits:0>3}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_card_dash_number() {
        assert_eq!(
            number_from_slug("https://example.com/Base-Set/Pikachu-Card-7"),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_slug_card_dash_number_case_insensitive() {
        assert_eq!(
            number_from_slug("https://example.com/set/Pikachu-card-25"),
            Some("25".to_string())
        );
    }

    #[test]
    fn test_slug_interior_card_fragment_yields_trailing_number() {
        // "Card-12" does not end the slug, so the trailing number wins.
        assert_eq!(
            number_from_slug("https://example.com/set/Promo-Card-12-of-99"),
            Some("99".to_string())
        );
    }

    #[test]
    fn test_slug_trailing_number() {
        assert_eq!(
            number_from_slug("https://example.com/set/Charizard-4"),
            Some("4".to_string())
        );
    }

    #[test]
    fn test_slug_ignores_query_string() {
        assert_eq!(
            number_from_slug("https://example.com/set/Pikachu-Card-7?ref=grid"),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_slug_without_number() {
        assert_eq!(number_from_slug("https://example.com/set/Pikachu"), None);
    }

    #[test]
    fn test_document_number_from_container_text() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-number">#25/102</div></body></html>"#,
        );
        assert_eq!(number_from_document(&html), Some("25".to_string()));
    }

    #[test]
    fn test_document_number_from_data_attribute() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-info" data-card-number="151"></div></body></html>"#,
        );
        assert_eq!(number_from_document(&html), Some("151".to_string()));
    }

    #[test]
    fn test_document_number_from_labeled_text() {
        let html = Html::parse_document(
            "<html><body><span>Card Number: 7 / 102</span></body></html>",
        );
        assert_eq!(number_from_document(&html), Some("7".to_string()));
    }

    #[test]
    fn test_document_without_number() {
        let html = Html::parse_document("<html><body><p>A lovely card.</p></body></html>");
        assert_eq!(number_from_document(&html), None);
    }

    #[test]
    fn test_normalize_pads_to_three_digits() {
        assert_eq!(normalize_number("7"), "007");
        assert_eq!(normalize_number("25"), "025");
        assert_eq!(normalize_number("151"), "151");
    }

    #[test]
    fn test_normalize_strips_leading_zeros_first() {
        assert_eq!(normalize_number("007"), "007");
        assert_eq!(normalize_number("0025"), "025");
    }

    #[test]
    fn test_normalize_preserves_four_digit_numbers() {
        assert_eq!(normalize_number("1234"), "1234");
    }

    #[test]
    fn test_normalize_all_zeros() {
        assert_eq!(normalize_number("000"), "000");
        assert_eq!(normalize_number("0"), "000");
    }
}
