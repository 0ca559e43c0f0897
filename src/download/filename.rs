//! Output path construction for downloaded card images.
//!
//! Card names come from arbitrary page text, so everything that lands in a
//! path goes through [`sanitize_component`] first. The resulting layout is
//! `<root>/<source>/<language>/<set_code>/<set_code>-<number>[-<name>].<ext>`.

use std::path::{Path, PathBuf};

use crate::model::CardRecord;

/// Extensions recognized as card images when archiving.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Longest name component kept in a filename.
const MAX_NAME_LEN: usize = 80;

/// Makes a string safe for use as a single path component.
///
/// Path separators and characters that are special on common filesystems are
/// replaced with underscores; whitespace collapses to single underscores and
/// the result is length-capped.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_sep = false;
    for c in raw.trim().chars() {
        let mapped = match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        };
        if mapped == '_' {
            if !last_was_sep {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.push(mapped);
            last_was_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

/// Picks the file extension from an image URL, defaulting to `.jpg`.
#[must_use]
pub fn extension_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let lower = path.to_ascii_lowercase();
    for ext in IMAGE_EXTENSIONS {
        if lower.ends_with(ext) {
            return ext;
        }
    }
    ".jpg"
}

/// File name for a card image: `<set_code>-<number>[-<name>].<ext>`.
///
/// The name part is dropped entirely when sanitization leaves nothing.
#[must_use]
pub fn card_file_name(record: &CardRecord) -> String {
    let set_code = sanitize_component(&record.set_code);
    let number = sanitize_component(&record.number);
    let name = sanitize_component(&record.name);
    let ext = extension_from_url(&record.image_url);

    if name.is_empty() {
        format!("{set_code}-{number}{ext}")
    } else {
        format!("{set_code}-{number}-{name}{ext}")
    }
}

/// Full output path for a card image under the output root.
#[must_use]
pub fn card_output_path(root: &Path, record: &CardRecord) -> PathBuf {
    root.join(record.source.as_str())
        .join(record.language.as_str())
        .join(sanitize_component(&record.set_code))
        .join(card_file_name(record))
}
