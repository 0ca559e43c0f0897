//! Site adapters for the supported card catalogs.
//!
//! Both catalogs are driven by one [`SiteAdapter`] engine; everything
//! site-specific (hosts, selectors, pagination style, page caps) lives in a
//! plain-data [`SiteProfile`]. Adding a catalog means writing a profile, not
//! another scraping loop.

mod pokellector;
mod tcgcollector;

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::extract::{extract_card_container, extract_card_page, parse_selector};
use crate::fetch::{FetchError, PageClient};
use crate::model::{CardRecord, Language, SetDescriptor, Source};

/// How an adapter advances to the next list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// `?page=N`, with a `/page/N` path fallback when the query form 404s.
    QueryPage,
    /// Full query-parameter form with display and page-size parameters.
    QueryParams,
}

/// Static description of one catalog site.
///
/// Pure data; the [`SiteAdapter`] engine interprets it.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Site this profile describes.
    pub source: Source,
    /// Base URL for the English catalog.
    pub base_url_en: &'static str,
    /// Base URL for the Japanese catalog.
    pub base_url_jp: &'static str,
    /// Path of the set index page for the English catalog.
    pub sets_path_en: &'static str,
    /// Path of the set index page for the Japanese catalog.
    pub sets_path_jp: &'static str,
    /// Selector matching set links on the index page.
    pub set_link_selector: &'static str,
    /// Suffix stripped from set names (e.g. `" Set"`).
    pub set_name_strip_suffix: Option<&'static str>,
    /// Suffix stripped from set codes (e.g. `"-Expansion"`).
    pub set_code_strip_suffix: Option<&'static str>,
    /// Candidate suffixes appended to the set URL to find the card list.
    pub list_url_suffixes: &'static [&'static str],
    /// Selector matching card tiles on list pages.
    pub container_selector: &'static str,
    /// Selector matching the next-page control.
    pub next_selector: &'static str,
    /// How to build next-page URLs.
    pub pagination: Pagination,
    /// Hard page cap guaranteeing termination.
    pub page_cap: u32,
    /// Whether an incomplete tile may fall back to a detail-page fetch.
    pub detail_fallback: bool,
}

impl SiteProfile {
    /// Returns the profile for a catalog site.
    #[must_use]
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Pokellector => pokellector::profile(),
            Source::Tcgcollector => tcgcollector::profile(),
        }
    }

    fn base_url(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.base_url_en,
            Language::Jp => self.base_url_jp,
        }
    }

    fn sets_path(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.sets_path_en,
            Language::Jp => self.sets_path_jp,
        }
    }
}

/// Anchor URL substrings that identify card links on unstructured pages.
const CARD_ANCHOR_PATTERNS: [&str; 4] = ["/card/", "/set/", "-card-", "-pkmn-"];

/// One tile found on a list page.
struct Tile {
    card_url: String,
    /// Present when the tile carried enough data to skip the detail fetch.
    record: Option<CardRecord>,
}

/// Synchronous scan result for one fetched page. Owns all its data so the
/// parsed document can be dropped before any further network calls.
enum PageScan {
    /// The page turned out to be a single card detail page.
    Detail(Box<CardRecord>),
    /// A list page with tiles and a next-page indicator.
    List { tiles: Vec<Tile>, has_next: bool },
}

/// Scraping engine for one catalog site and language.
pub struct SiteAdapter {
    profile: SiteProfile,
    language: Language,
    base: Url,
    client: PageClient,
    set_link_selector: Selector,
    container_selector: Selector,
    next_selector: Selector,
    anchor_selector: Selector,
}

impl SiteAdapter {
    /// Creates an adapter for a catalog site and language.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the profile's base URL does not
    /// parse, which would be a profile bug.
    pub fn new(
        source: Source,
        language: Language,
        client: PageClient,
    ) -> Result<Self, FetchError> {
        let profile = SiteProfile::for_source(source);
        let base_url = profile.base_url(language).to_string();
        Self::with_base(profile, language, client, &base_url)
    }

    /// Creates an adapter with an explicit base URL (tests point this at a
    /// local mock server).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base(
        profile: SiteProfile,
        language: Language,
        client: PageClient,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let base = Url::parse(base_url).map_err(|_| FetchError::invalid_url(base_url))?;
        let set_link_selector = parse_selector(profile.set_link_selector);
        let container_selector = parse_selector(profile.container_selector);
        let next_selector = parse_selector(profile.next_selector);
        Ok(Self {
            profile,
            language,
            base,
            client,
            set_link_selector,
            container_selector,
            next_selector,
            anchor_selector: parse_selector("a[href]"),
        })
    }

    /// Overrides the pagination safety cap (tests use a small cap).
    #[must_use]
    pub fn with_page_cap(mut self, cap: u32) -> Self {
        self.profile.page_cap = cap;
        self
    }

    /// Site this adapter scrapes.
    #[must_use]
    pub fn source(&self) -> Source {
        self.profile.source
    }

    /// Discovers all card sets on the catalog's set index page.
    ///
    /// Fetch and parse failures are logged and yield an empty list; the run
    /// carries on with whatever was found.
    #[instrument(skip(self), fields(source = %self.profile.source, language = %self.language))]
    pub async fn discover_sets(&self) -> Vec<SetDescriptor> {
        let sets_url = format!(
            "{}{}",
            self.base.as_str().trim_end_matches('/'),
            self.profile.sets_path(self.language)
        );
        info!(url = %sets_url, "discovering sets");

        let document = match self.client.fetch_document(&sets_url).await {
            Ok(document) => document,
            Err(error) => {
                warn!(error = %error, "failed to fetch set index");
                return Vec::new();
            }
        };

        let sets = self.scan_set_index(&document);
        info!(count = sets.len(), "sets discovered");
        sets
    }

    /// Parses the set index document into descriptors, deduplicated by code.
    fn scan_set_index(&self, document: &Html) -> Vec<SetDescriptor> {
        let mut seen = HashSet::new();
        let mut sets = Vec::new();

        for link in document.select(&self.set_link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Ok(url) = self.base.join(href) else {
                continue;
            };

            let mut name = link
                .value()
                .attr("title")
                .map_or_else(|| link.text().collect::<String>(), str::to_string)
                .trim()
                .to_string();
            if let Some(suffix) = self.profile.set_name_strip_suffix {
                if let Some(stripped) = name.strip_suffix(suffix) {
                    name = stripped.trim_end().to_string();
                }
            }

            let code = self.set_code_from_url(&url);
            if name.is_empty() || code.is_empty() {
                warn!(url = %url, "skipping set with missing name or code");
                continue;
            }
            if !seen.insert(code.clone()) {
                continue;
            }

            debug!(name = %name, code = %code, "found set");
            sets.push(SetDescriptor {
                name,
                code,
                url: url.to_string(),
                source: self.profile.source,
                language: self.language,
            });
        }
        sets
    }

    /// Derives the filesystem-safe set code from the trailing URL segment.
    fn set_code_from_url(&self, url: &Url) -> String {
        let segment = url
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let trimmed = self
            .profile
            .set_code_strip_suffix
            .and_then(|suffix| segment.strip_suffix(suffix))
            .unwrap_or(segment);
        trimmed
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }

    /// Collects all cards in a set, following pagination up to the profile's
    /// page cap. Errors at page and card level are logged and absorbed.
    #[instrument(skip(self, set), fields(set = %set.code))]
    pub async fn cards_in_set(&self, set: &SetDescriptor) -> Vec<CardRecord> {
        let Some((list_url, first_scan)) = self.probe_list_page(set).await else {
            warn!(set = %set.name, "no card list page found");
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut cards = Vec::new();
        let mut scan = first_scan;
        let mut page: u32 = 1;

        loop {
            let has_next = match scan {
                PageScan::Detail(record) => {
                    if seen.insert(record.card_url.clone()) {
                        cards.push(*record);
                    }
                    false
                }
                PageScan::List { tiles, has_next } => {
                    debug!(page, tiles = tiles.len(), "scanning list page");
                    for tile in tiles {
                        if !seen.insert(tile.card_url.clone()) {
                            continue;
                        }
                        match tile.record {
                            Some(record) => cards.push(record),
                            None => {
                                if let Some(record) = self.fetch_card(&tile.card_url, set).await {
                                    cards.push(record);
                                }
                            }
                        }
                    }
                    has_next
                }
            };

            if !has_next {
                break;
            }
            if page >= self.profile.page_cap {
                warn!(
                    page,
                    cap = self.profile.page_cap,
                    "page cap reached, stopping pagination"
                );
                break;
            }
            page += 1;

            let Some(next_scan) = self.fetch_next_page(&list_url, page, set).await else {
                break;
            };
            scan = next_scan;
        }

        info!(set = %set.name, cards = cards.len(), "set scan complete");
        cards
    }

    /// Tries each candidate list URL until one fetches, returning its scan.
    async fn probe_list_page(&self, set: &SetDescriptor) -> Option<(String, PageScan)> {
        let set_url = set.url.trim_end_matches('/');
        for suffix in self.profile.list_url_suffixes {
            let candidate = format!("{set_url}{suffix}");
            debug!(url = %candidate, "trying card list URL");
            match self.client.fetch_document(&candidate).await {
                Ok(document) => {
                    let scan = self.scan_page(&document, &candidate, set);
                    return Some((candidate, scan));
                }
                Err(error) => debug!(url = %candidate, error = %error, "candidate failed"),
            }
        }
        None
    }

    /// Fetches one pagination step, using the profile's URL form. The
    /// `QueryPage` style falls back to a `/page/N` path when `?page=N` fails.
    async fn fetch_next_page(
        &self,
        list_url: &str,
        page: u32,
        set: &SetDescriptor,
    ) -> Option<PageScan> {
        let url = match self.profile.pagination {
            Pagination::QueryPage => format!("{list_url}?page={page}"),
            Pagination::QueryParams => format!(
                "{list_url}?releaseDateOrder=newToOld&displayAs=images&page={page}&pageSize=100"
            ),
        };

        match self.client.fetch_document(&url).await {
            Ok(document) => return Some(self.scan_page(&document, &url, set)),
            Err(error) => debug!(url = %url, error = %error, "next page fetch failed"),
        }

        if self.profile.pagination == Pagination::QueryPage {
            let fallback = format!("{list_url}/page/{page}");
            match self.client.fetch_document(&fallback).await {
                Ok(document) => return Some(self.scan_page(&document, &fallback, set)),
                Err(error) => {
                    warn!(url = %fallback, error = %error, "pagination exhausted");
                }
            }
        }
        None
    }

    /// Fetches a card detail page and extracts the record from it.
    async fn fetch_card(&self, card_url: &str, set: &SetDescriptor) -> Option<CardRecord> {
        match self.client.fetch_document(card_url).await {
            Ok(document) => {
                let record = extract_card_page(&document, card_url, set, &self.base);
                if record.is_none() {
                    warn!(url = %card_url, "no card could be extracted from detail page");
                }
                record
            }
            Err(error) => {
                warn!(url = %card_url, error = %error, "card page fetch failed");
                None
            }
        }
    }

    /// Synchronously classifies and scans one fetched page.
    ///
    /// The single-card detail interpretation is tried first and wins when it
    /// yields a full record, even if the page also carries tile-like markup
    /// (related-card strips on detail pages). Only then is the page treated
    /// as a tile list, and finally as an unstructured anchor list.
    fn scan_page(&self, document: &Html, page_url: &str, set: &SetDescriptor) -> PageScan {
        if let Some(record) = extract_card_page(document, page_url, set, &self.base) {
            debug!(set = %set.code, "page is a single card detail page");
            return PageScan::Detail(Box::new(record));
        }

        let tiles = self.scan_tiles(document, set);
        let has_next = document.select(&self.next_selector).next().is_some();

        if !tiles.is_empty() {
            return PageScan::List { tiles, has_next };
        }

        PageScan::List {
            tiles: self.scan_anchors(document),
            has_next,
        }
    }

    /// Scans structured card tiles.
    ///
    /// A tile that already carries name, number, and image becomes a ready
    /// record and costs no further fetch. Incomplete tiles fall back to a
    /// detail-page fetch when the profile allows one and the tile links
    /// somewhere; otherwise they are dropped.
    fn scan_tiles(&self, document: &Html, set: &SetDescriptor) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for container in document.select(&self.container_selector) {
            let link = self.tile_link(container);
            let card_url = link.clone().unwrap_or_else(|| set.url.clone());

            if let Some(record) = extract_card_container(container, &card_url, set, &self.base) {
                tiles.push(Tile {
                    card_url,
                    record: Some(record),
                });
                continue;
            }

            if self.profile.detail_fallback {
                if let Some(card_url) = link {
                    tiles.push(Tile {
                        card_url,
                        record: None,
                    });
                }
            }
        }
        tiles
    }

    /// Finds the link a tile points at: an inner anchor first, then an
    /// enclosing anchor (grid tiles are often wrapped in one).
    fn tile_link(&self, container: ElementRef<'_>) -> Option<String> {
        if let Some(anchor) = container.select(&self.anchor_selector).next() {
            if let Some(href) = anchor.value().attr("href") {
                if let Ok(url) = self.base.join(href) {
                    return Some(url.to_string());
                }
            }
        }
        for ancestor in container.ancestors() {
            if let Some(element) = ElementRef::wrap(ancestor) {
                if element.value().name() == "a" {
                    if let Some(href) = element.value().attr("href") {
                        if let Ok(url) = self.base.join(href) {
                            return Some(url.to_string());
                        }
                    }
                }
            }
        }
        None
    }

    /// Unstructured fallback: every anchor whose URL looks like a card link.
    fn scan_anchors(&self, document: &Html) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for anchor in document.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let lower = href.to_ascii_lowercase();
            if !CARD_ANCHOR_PATTERNS
                .iter()
                .any(|pattern| lower.contains(pattern))
            {
                continue;
            }
            if let Ok(url) = self.base.join(href) {
                tiles.push(Tile {
                    card_url: url.to_string(),
                    record: None,
                });
            }
        }
        tiles
    }
}
