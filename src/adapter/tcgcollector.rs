//! TCG Collector site profile.
//!
//! One host for both catalogs; the Japanese-language run reads the
//! international index path. Grid tiles carry name, number, and image
//! inline; a tile missing data is dropped rather than chased to a detail
//! page.

use super::{Pagination, SiteProfile};
use crate::model::Source;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        source: Source::Tcgcollector,
        base_url_en: "https://www.tcgcollector.com",
        base_url_jp: "https://www.tcgcollector.com",
        sets_path_en: "/sets",
        sets_path_jp: "/sets/intl",
        set_link_selector: "a.set-logo-grid-item-set-name",
        set_name_strip_suffix: None,
        set_code_strip_suffix: Some("-Expansion"),
        list_url_suffixes: &[""],
        container_selector: ".card-image-grid-item, .card-item",
        next_selector: r#"a.page-link[rel="next"], a.next-page, a[rel="next"]"#,
        pagination: Pagination::QueryParams,
        page_cap: 50,
        detail_fallback: false,
    }
}
