//! Canonical record types shared across the scraping pipeline.
//!
//! A [`SetDescriptor`] is produced once during discovery and never mutated.
//! A [`CardRecord`] is produced by the extractor and consumed exactly once
//! by the download phase; its [`CardRecord::download_id`] is the idempotence
//! key for the persisted progress set.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Catalog site a record was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Source {
    /// Pokellector (pokellector.com / jp.pokellector.com)
    Pokellector,
    /// TCG Collector (tcgcollector.com)
    Tcgcollector,
}

impl Source {
    /// Stable lowercase identifier used in paths and download identities.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pokellector => "pokellector",
            Self::Tcgcollector => "tcgcollector",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Language {
    /// English catalog
    En,
    /// Japanese catalog
    Jp,
}

impl Language {
    /// Stable lowercase identifier used in paths and download identities.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Jp => "jp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered card set (collection) on a catalog site.
///
/// `code` is a filesystem-safe slug derived from the set URL, unique within
/// one source/language scope. Immutable after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDescriptor {
    /// Human-readable set name.
    pub name: String,
    /// Filesystem-safe slug derived from the trailing URL segment.
    pub code: String,
    /// Absolute URL of the set page.
    pub url: String,
    /// Site the set was discovered on.
    pub source: Source,
    /// Catalog language the set was discovered under.
    pub language: Language,
}

/// A fully extracted card, ready for download.
///
/// Invariant: `image_url` is absolute, scheme-qualified, and carries no query
/// string (the extractor strips it before the record is emitted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    /// Card name after annotation cleanup.
    pub name: String,
    /// Card number, zero-padded to three digits for numeric schemes.
    pub number: String,
    /// Absolute image URL with no query string.
    pub image_url: String,
    /// Absolute URL of the card page (or the set page when no detail page exists).
    pub card_url: String,
    /// Slug of the owning set.
    pub set_code: String,
    /// Name of the owning set.
    pub set_name: String,
    /// Site the card was extracted from.
    pub source: Source,
    /// Catalog language the card was extracted under.
    pub language: Language,
}

impl CardRecord {
    /// Idempotence key for the progress set and the output path.
    ///
    /// Maps one-to-one to a card record and to its final file path.
    #[must_use]
    pub fn download_id(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.source.as_str(),
            self.language.as_str(),
            self.set_code,
            self.number
        )
    }
}
