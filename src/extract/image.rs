//! Card image URL extraction.
//!
//! Image candidates are gathered from a prioritized selector list, read from
//! lazy-loading attributes as well as plain `src`, resolved against the page
//! base URL, and gated on a known image extension. Query strings and
//! fragments are stripped so the same image never downloads twice under
//! cache-busting parameters.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use super::parse_selector;

/// Image selectors tried in priority order against the detail page.
static IMAGE_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "div.card-image img",
        ".card-image img",
        ".product-image img",
        ".card-img img",
        "img.card-image",
        "img.product-image",
        "img.wp-post-image",
        "img.attachment-full",
        "img.size-full",
        r#"img[src*="cards"]"#,
        r#"img[src*="card"]"#,
        r#"img[src*="images"]"#,
        r#"img[src*="image"]"#,
    ]
    .iter()
    .map(|css| parse_selector(css))
    .collect()
});

/// Attributes that may hold the image URL, lazy-load variants first.
pub const IMAGE_SRC_ATTRS: [&str; 3] = ["data-src", "data-lazy-src", "src"];

/// Extensions accepted as card images on detail pages.
const ACCEPTED_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// Extracts the card image URL from a parsed detail page.
///
/// Returns an absolute URL with query string and fragment removed, or `None`
/// when no candidate resolves to an accepted image extension.
#[must_use]
pub fn image_from_document(document: &Html, base: &Url) -> Option<String> {
    for selector in IMAGE_SELECTORS.iter() {
        for element in document.select(selector) {
            for attr in IMAGE_SRC_ATTRS {
                let Some(raw) = element.value().attr(attr) else {
                    continue;
                };
                if let Some(resolved) = resolve_and_strip(raw, base) {
                    if has_accepted_extension(&resolved) {
                        return Some(resolved);
                    }
                }
            }
        }
    }
    None
}

/// Returns the `alt` text of the first plausible card image, used as a name
/// fallback when the page has no usable heading.
#[must_use]
pub fn image_alt_from_document(document: &Html) -> Option<String> {
    for selector in IMAGE_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(alt) = element.value().attr("alt") {
                let trimmed = alt.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}

/// Resolves a possibly-relative URL against `base` and strips query and
/// fragment. Returns `None` for empty or unresolvable inputs.
#[must_use]
pub fn resolve_and_strip(raw: &str, base: &Url) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut resolved = base.join(trimmed).ok()?;
    resolved.set_query(None);
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Whether the URL path ends in an accepted image extension.
fn has_accepted_extension(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
