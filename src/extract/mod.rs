//! Card field extraction from catalog HTML.
//!
//! Two entry points: [`extract_card_page`] for card detail pages and
//! [`extract_card_container`] for list-page grid tiles. Both degrade field
//! by field (missing name falls back through slug and image alt text) and
//! give up on a whole card only when a required field is unrecoverable, in
//! which case they return `None` rather than fail the run. Misses are debug
//! events here; callers decide whether a miss is worth a warning, since both
//! functions also get pages that may simply not be card pages.

mod image;
mod name;
mod number;

pub use image::{IMAGE_SRC_ATTRS, image_alt_from_document, image_from_document, resolve_and_strip};
pub use name::{clean_name, name_from_document, name_from_slug};
pub use number::{normalize_number, number_from_document, number_from_slug};

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::model::{CardRecord, SetDescriptor};

/// Parses a static CSS selector known to be valid.
///
/// # Panics
///
/// Panics on a malformed selector. All call sites pass compile-time string
/// literals, so a panic here is a programming error caught by the first test
/// that touches the selector table.
#[must_use]
#[allow(clippy::unwrap_used)]
pub(crate) fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

/// Builds a [`CardRecord`] from a parsed card detail page.
///
/// The number is resolved slug-first, then from the page; the name falls
/// back through slug and image alt text to a `Card-<number>` placeholder.
/// Returns `None` when the number or image cannot be found.
#[must_use]
pub fn extract_card_page(
    document: &Html,
    card_url: &str,
    set: &SetDescriptor,
    base: &Url,
) -> Option<CardRecord> {
    let raw_number = number_from_slug(card_url).or_else(|| number_from_document(document));
    let Some(raw_number) = raw_number else {
        debug!(url = %card_url, "no card number found on page");
        return None;
    };
    let number = normalize_number(&raw_number);

    let Some(image_url) = image_from_document(document, base) else {
        debug!(url = %card_url, "no card image found on page");
        return None;
    };

    let name = name_from_document(document)
        .or_else(|| name_from_slug(card_url))
        .or_else(|| image_alt_from_document(document).map(|alt| clean_name(&alt)))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Card-{number}"));

    Some(CardRecord {
        name,
        number,
        image_url,
        card_url: card_url.to_string(),
        set_code: set.code.clone(),
        set_name: set.name.clone(),
        source: set.source,
        language: set.language,
    })
}

/// Name selectors for list-page tiles.
const CONTAINER_NAME_SELECTORS: [&str; 5] = [".card-name", ".name", ".title", "h3", "h4"];

/// Number selectors for list-page tiles.
const CONTAINER_NUMBER_SELECTORS: [&str; 3] = [".card-number", ".number", ".num"];

/// Builds a [`CardRecord`] directly from a list-page grid tile.
///
/// Used when the tile carries everything needed and no detail page fetch is
/// required. Tiles without an image or a resolvable number yield `None`.
#[must_use]
pub fn extract_card_container(
    container: ElementRef<'_>,
    card_url: &str,
    set: &SetDescriptor,
    base: &Url,
) -> Option<CardRecord> {
    let image = container
        .select(&parse_selector("img"))
        .next()
        .and_then(|img| {
            IMAGE_SRC_ATTRS
                .iter()
                .find_map(|attr| img.value().attr(attr))
                .and_then(|raw| resolve_and_strip(raw, base))
                .map(|url| (url, img.value().attr("alt").map(str::to_string)))
        });
    let Some((image_url, alt)) = image else {
        debug!(url = %card_url, "tile has no image");
        return None;
    };

    let raw_number = CONTAINER_NUMBER_SELECTORS
        .iter()
        .find_map(|css| {
            container
                .select(&parse_selector(css))
                .next()
                .map(|e| e.text().collect::<String>())
        })
        .and_then(|text| extract_digits(&text))
        .or_else(|| number_from_slug(card_url));
    let Some(raw_number) = raw_number else {
        debug!(url = %card_url, "tile has no number");
        return None;
    };
    let number = normalize_number(&raw_number);

    let name = CONTAINER_NAME_SELECTORS
        .iter()
        .find_map(|css| {
            container
                .select(&parse_selector(css))
                .next()
                .map(|e| clean_name(&e.text().collect::<String>()))
                .filter(|n| !n.is_empty())
        })
        .or_else(|| alt.map(|a| clean_name(&a)).filter(|n| !n.is_empty()))
        .or_else(|| name_from_slug(card_url))
        .unwrap_or_else(|| format!("Card-{number}"));

    Some(CardRecord {
        name,
        number,
        image_url,
        card_url: card_url.to_string(),
        set_code: set.code.clone(),
        set_name: set.name.clone(),
        source: set.source,
        language: set.language,
    })
}

/// First run of digits in a text snippet.
fn extract_digits(text: &str) -> Option<String> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() { None } else { Some(digits) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Language, Source};

    fn sample_set() -> SetDescriptor {
        SetDescriptor {
            name: "Base Set".to_string(),
            code: "Base-Set".to_string(),
            url: "https://example.com/sets/Base-Set".to_string(),
            source: Source::Pokellector,
            language: Language::En,
        }
    }

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_extract_card_page_complete() {
        let html = Html::parse_document(
            r#"<html><body>
                <h1 class="entry-title">Pikachu [Promo] #7</h1>
                <div class="card-image"><img src="/cards/007.jpg"></div>
            </body></html>"#,
        );
        let record = extract_card_page(
            &html,
            "https://example.com/Base-Set/Pikachu-Card-7",
            &sample_set(),
            &base(),
        )
        .unwrap();

        assert_eq!(record.name, "Pikachu");
        assert_eq!(record.number, "007");
        assert_eq!(record.image_url, "https://example.com/cards/007.jpg");
        assert_eq!(record.set_code, "Base-Set");
    }

    #[test]
    fn test_extract_card_page_name_falls_back_to_slug() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-image"><img src="/cards/004.jpg"></div></body></html>"#,
        );
        let record = extract_card_page(
            &html,
            "https://example.com/Base-Set/Dark-Charizard-Card-4",
            &sample_set(),
            &base(),
        )
        .unwrap();
        assert_eq!(record.name, "Dark Charizard");
        assert_eq!(record.number, "004");
    }

    #[test]
    fn test_extract_card_page_missing_image_skips() {
        let html = Html::parse_document(
            r#"<html><body><h1 class="entry-title">Pikachu</h1></body></html>"#,
        );
        let record = extract_card_page(
            &html,
            "https://example.com/Base-Set/Pikachu-Card-7",
            &sample_set(),
            &base(),
        );
        assert!(record.is_none());
    }

    #[test]
    fn test_extract_card_page_missing_number_skips() {
        let html = Html::parse_document(
            r#"<html><body>
                <h1 class="entry-title">Pikachu</h1>
                <div class="card-image"><img src="/cards/pikachu.jpg"></div>
            </body></html>"#,
        );
        let record = extract_card_page(
            &html,
            "https://example.com/Base-Set/Pikachu",
            &sample_set(),
            &base(),
        );
        assert!(record.is_none());
    }

    #[test]
    fn test_extract_card_container_complete() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-item">
                <span class="card-name">Bulbasaur</span>
                <span class="card-number">#44/102</span>
                <img data-src="/cards/044.jpg" src="placeholder.gif">
            </div></body></html>"#,
        );
        let selector = parse_selector(".card-item");
        let container = html.select(&selector).next().unwrap();
        let record = extract_card_container(
            container,
            "https://example.com/Base-Set/Bulbasaur-Card-44",
            &sample_set(),
            &base(),
        )
        .unwrap();

        assert_eq!(record.name, "Bulbasaur");
        assert_eq!(record.number, "044");
        assert_eq!(record.image_url, "https://example.com/cards/044.jpg");
    }

    #[test]
    fn test_extract_card_container_alt_text_name_fallback() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-item">
                <img src="/cards/050.jpg" alt="Diglett #50">
            </div></body></html>"#,
        );
        let selector = parse_selector(".card-item");
        let container = html.select(&selector).next().unwrap();
        let record = extract_card_container(
            container,
            "https://example.com/Base-Set/tile-50",
            &sample_set(),
            &base(),
        )
        .unwrap();
        assert_eq!(record.name, "Diglett");
        assert_eq!(record.number, "050");
    }

    #[test]
    fn test_extract_card_container_without_image_skips() {
        let html = Html::parse_document(
            r#"<html><body><div class="card-item">
                <span class="card-name">Bulbasaur</span>
            </div></body></html>"#,
        );
        let selector = parse_selector(".card-item");
        let container = html.select(&selector).next().unwrap();
        let record = extract_card_container(
            container,
            "https://example.com/Base-Set/Bulbasaur-Card-44",
            &sample_set(),
            &base(),
        );
        assert!(record.is_none());
    }

    #[test]
    fn test_extract_digits() {
        assert_eq!(extract_digits("#44/102"), Some("44".to_string()));
        assert_eq!(extract_digits("No. 7"), Some("7".to_string()));
        assert_eq!(extract_digits("none"), None);
    }
}
