//! Card name extraction and cleanup.
//!
//! Detail pages get a heading-selector sweep; when the page yields nothing,
//! the URL slug is decoded into a readable name. Either way the result is
//! run through [`clean_name`] so bracketed annotations and trailing numbers
//! never leak into filenames.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::parse_selector;

/// Name selectors tried in priority order against the detail page.
///
/// Kept as separate selectors: a grouped selector yields matches in document
/// order, which would let a stray `.title` beat the page heading.
static NAME_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "h1.entry-title",
        "h1.product-title",
        "h1.product-name",
        "h1.product_title",
        "h1",
        ".card-title",
        ".card-name",
        ".title",
    ]
    .iter()
    .map(|css| parse_selector(css))
    .collect()
});

/// Bracketed or braced annotations: `[Promo]`, `{Holo}`.
static ANNOTATION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\s*[\[\{].*?[\]\}]").ok());

/// Trailing number suffix: `#7`, `#25/102 Rare`.
static NUMBER_SUFFIX_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\s*#\d+.*$").ok());

/// Extracts the card name from a parsed detail page, already cleaned.
///
/// Returns `None` when every selector comes up empty.
#[must_use]
pub fn name_from_document(document: &Html) -> Option<String> {
    for selector in NAME_SELECTORS.iter() {
        for element in document.select(selector) {
            let text: String = element.text().collect();
            let cleaned = clean_name(&text);
            if !cleaned.is_empty() {
                return Some(cleaned);
            }
        }
    }
    None
}

/// Derives a readable name from the final path segment of a card URL.
///
/// Everything before a `-Card-` marker is kept, percent-escapes are decoded,
/// hyphens become spaces, and each word is title-cased:
/// `Surging-Sparks/Pikachu-ex-Card-57` yields `"Pikachu Ex"`.
#[must_use]
pub fn name_from_slug(card_url: &str) -> Option<String> {
    let slug = card_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .split('?')
        .next()?;

    let base = match slug.find("-Card-") {
        Some(idx) => &slug[..idx],
        None => slug,
    };

    let decoded = urlencoding::decode(base).map_or_else(|_| base.to_string(), |s| s.into_owned());
    let name = title_case(&decoded.replace(['-', '_'], " "));
    let cleaned = clean_name(&name);
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Strips bracketed annotations and trailing `#number` suffixes from a name.
///
/// `"Pikachu [Promo] #7"` becomes `"Pikachu"`.
#[must_use]
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.to_string();
    if let Some(re) = ANNOTATION_RE.as_ref() {
        name = re.replace_all(&name, "").into_owned();
    }
    if let Some(re) = NUMBER_SUFFIX_RE.as_ref() {
        name = re.replace(&name, "").into_owned();
    }
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercases the first letter of each whitespace-separated word.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_bracket_annotation() {
        assert_eq!(clean_name("Pikachu [Promo] #7"), "Pikachu");
    }

    #[test]
    fn test_clean_name_strips_brace_annotation() {
        assert_eq!(clean_name("Charizard {Holo}"), "Charizard");
    }

    #[test]
    fn test_clean_name_strips_number_suffix_with_trailer() {
        assert_eq!(clean_name("Mewtwo #150/165 Rare"), "Mewtwo");
    }

    #[test]
    fn test_clean_name_collapses_whitespace() {
        assert_eq!(clean_name("  Mr.   Mime  "), "Mr. Mime");
    }

    #[test]
    fn test_clean_name_plain_name_untouched() {
        assert_eq!(clean_name("Pikachu"), "Pikachu");
    }

    #[test]
    fn test_name_from_document_entry_title() {
        let html = Html::parse_document(
            r#"<html><body><h1 class="entry-title">Pikachu [Promo] #7</h1></body></html>"#,
        );
        assert_eq!(name_from_document(&html), Some("Pikachu".to_string()));
    }

    #[test]
    fn test_name_from_document_falls_back_to_card_title() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-title">Snorlax</div></body></html>"#,
        );
        assert_eq!(name_from_document(&html), Some("Snorlax".to_string()));
    }

    #[test]
    fn test_name_from_document_empty_page() {
        let html = Html::parse_document("<html><body></body></html>");
        assert_eq!(name_from_document(&html), None);
    }

    #[test]
    fn test_name_from_slug_with_card_marker() {
        assert_eq!(
            name_from_slug("https://example.com/Base-Set/Pikachu-Card-7"),
            Some("Pikachu".to_string())
        );
    }

    #[test]
    fn test_name_from_slug_multi_word() {
        assert_eq!(
            name_from_slug("https://example.com/set/Dark-Charizard-Card-4"),
            Some("Dark Charizard".to_string())
        );
    }

    #[test]
    fn test_name_from_slug_percent_decoded() {
        assert_eq!(
            name_from_slug("https://example.com/set/Farfetch%27d-Card-27"),
            Some("Farfetch'd".to_string())
        );
    }

    #[test]
    fn test_name_from_slug_without_marker() {
        assert_eq!(
            name_from_slug("https://example.com/set/alolan-vulpix"),
            Some("Alolan Vulpix".to_string())
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("dark charizard"), "Dark Charizard");
    }
}
