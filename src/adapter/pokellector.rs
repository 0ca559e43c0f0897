//! Pokellector site profile.
//!
//! Pokellector splits languages across hosts (`www` / `jp`). Grid tiles
//! sometimes carry full card data and sometimes only a link, so incomplete
//! tiles may fall back to a detail-page fetch.

use super::{Pagination, SiteProfile};
use crate::model::Source;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        source: Source::Pokellector,
        base_url_en: "https://www.pokellector.com",
        base_url_jp: "https://jp.pokellector.com",
        sets_path_en: "/sets",
        sets_path_jp: "/sets",
        set_link_selector: "a.button[name]",
        set_name_strip_suffix: Some(" Set"),
        set_code_strip_suffix: Some("-Expansion"),
        list_url_suffixes: &["", "/cards", "/all"],
        container_selector: ".card-container, .card-item, .card-wrapper, .grid-item",
        next_selector: r#"a.next, .pagination .next, .next-page, a[rel="next"], .pagination-next a"#,
        pagination: Pagination::QueryPage,
        page_cap: 20,
        detail_fallback: true,
    }
}
