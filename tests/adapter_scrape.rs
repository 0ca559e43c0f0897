//! Adapter integration tests against a local mock catalog.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cardfetch_core::adapter::SiteAdapter;
use cardfetch_core::{Language, PageClient, RetryPolicy, SetDescriptor, SiteProfile, Source};

fn fast_client() -> PageClient {
    PageClient::new(Duration::ZERO).with_retry_policy(RetryPolicy::new(
        0,
        Duration::from_millis(1),
        Duration::from_millis(1),
    ))
}

fn pokellector_adapter(server: &MockServer) -> SiteAdapter {
    SiteAdapter::with_base(
        SiteProfile::for_source(Source::Pokellector),
        Language::En,
        fast_client(),
        &server.uri(),
    )
    .expect("mock server URI must parse")
}

fn set_for(server: &MockServer, code: &str, name: &str) -> SetDescriptor {
    SetDescriptor {
        name: name.to_string(),
        code: code.to_string(),
        url: format!("{}/sets/{code}", server.uri()),
        source: Source::Pokellector,
        language: Language::En,
    }
}

#[tokio::test]
async fn discovers_sets_from_index_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a class="button" name="b" href="/sets/Base-Set-Expansion" title="Base Set">Base</a>
                <a class="button" name="j" href="/sets/Jungle-Expansion" title="Jungle Set">Jungle</a>
                <a class="button" name="dup" href="/sets/Base-Set-Expansion" title="Base Set">Base</a>
                <a href="/about">About</a>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let sets = adapter.discover_sets().await;

    assert_eq!(sets.len(), 2, "duplicates and non-set links are dropped");
    assert_eq!(sets[0].code, "Base-Set");
    assert_eq!(sets[0].name, "Base");
    assert_eq!(sets[1].code, "Jungle");
}

#[tokio::test]
async fn discovery_failure_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    assert!(adapter.discover_sets().await.is_empty());
}

#[tokio::test]
async fn scrapes_cards_via_detail_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets/Base-Set"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="card-container"><a href="/Base-Set/Pikachu-Card-7">Pikachu</a></div>
                <div class="card-container"><a href="/Base-Set/Charizard-Card-4">Charizard</a></div>
                <div class="card-container"><a href="/Base-Set/Pikachu-Card-7">dup</a></div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Base-Set/Pikachu-Card-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="entry-title">Pikachu [Promo] #7</h1>
                <div class="card-image"><img src="/images/007.jpg"></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Base-Set/Charizard-Card-4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="entry-title">Charizard</h1>
                <div class="card-image"><img src="/images/004.jpg"></div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let set = set_for(&server, "Base-Set", "Base Set");
    let mut cards = adapter.cards_in_set(&set).await;
    cards.sort_by(|a, b| a.number.cmp(&b.number));

    assert_eq!(cards.len(), 2, "duplicate card URLs collapse to one record");
    assert_eq!(cards[0].name, "Charizard");
    assert_eq!(cards[0].number, "004");
    assert_eq!(cards[1].name, "Pikachu");
    assert_eq!(cards[1].number, "007");
    assert!(cards[1].image_url.ends_with("/images/007.jpg"));
}

#[tokio::test]
async fn detail_page_wins_over_embedded_related_tile() {
    let server = MockServer::start().await;
    // A single-card set URL resolves straight to a detail page that also
    // carries a related-card tile. The page's own card must win; the
    // related card's detail page is never fetched.
    Mock::given(method("GET"))
        .and(path("/sets/Promo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="entry-title">Pikachu</h1>
                <div class="card-number">#7/102</div>
                <div class="card-image"><img src="/images/007.jpg"></div>
                <div class="card-container">
                    <a href="/Promo/Raichu-Card-8"><img src="/media/008.jpg"></a>
                </div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Promo/Raichu-Card-8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let set = set_for(&server, "Promo", "Promo");
    let cards = adapter.cards_in_set(&set).await;

    assert_eq!(cards.len(), 1, "the page is one card, not a list");
    assert_eq!(cards[0].name, "Pikachu");
    assert_eq!(cards[0].number, "007");
    assert!(cards[0].image_url.ends_with("/images/007.jpg"));
}

#[tokio::test]
async fn complete_tiles_skip_detail_fetch() {
    let server = MockServer::start().await;
    // Tiles that carry name, number (via slug), and image are taken as-is;
    // only incomplete tiles fall back to their detail pages.
    Mock::given(method("GET"))
        .and(path("/sets/Neo-Genesis"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="card-container">
                    <a href="/Neo-Genesis/Pikachu-Card-7">
                        <img src="/media/007.jpg">
                        <span class="card-name">Pikachu</span>
                    </a>
                </div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Neo-Genesis/Pikachu-Card-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let set = set_for(&server, "Neo-Genesis", "Neo Genesis");
    let cards = adapter.cards_in_set(&set).await;

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "Pikachu");
    assert_eq!(cards[0].number, "007");
    assert!(cards[0].image_url.ends_with("/media/007.jpg"));
}

#[tokio::test]
async fn falls_back_to_cards_suffix_when_bare_url_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets/Jungle"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sets/Jungle/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="card-container"><a href="/Jungle/Snorlax-Card-11">Snorlax</a></div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Jungle/Snorlax-Card-11"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1>Snorlax</h1>
                <div class="card-image"><img src="/images/011.jpg"></div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let set = set_for(&server, "Jungle", "Jungle");
    let cards = adapter.cards_in_set(&set).await;

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].number, "011");
}

#[tokio::test]
async fn empty_list_page_yields_empty_vec() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets/Empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Coming soon.</p></body></html>"),
        )
        .mount(&server)
        .await;

    let adapter = pokellector_adapter(&server);
    let set = set_for(&server, "Empty", "Empty");
    assert!(adapter.cards_in_set(&set).await.is_empty());
}

#[tokio::test]
async fn pagination_terminates_at_page_cap() {
    let server = MockServer::start().await;

    fn page_body(card: u32) -> String {
        format!(
            r##"<html><body>
                <div class="card-container"><a href="/Loop/Card-{card}">card</a></div>
                <a class="next" href="#">Next</a>
            </body></html>"##
        )
    }

    // The next-page control is always present; only the cap stops the loop.
    for page in 2..=10u32 {
        Mock::given(method("GET"))
            .and(path("/sets/Loop"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_body(page)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/sets/Loop"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_body(1)))
        .mount(&server)
        .await;
    for card in 1..=10u32 {
        Mock::given(method("GET"))
            .and(path(format!("/Loop/Card-{card}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><body>
                    <h1>Card {card}</h1>
                    <div class="card-image"><img src="/images/{card}.jpg"></div>
                </body></html>"#
            )))
            .mount(&server)
            .await;
    }

    let adapter = pokellector_adapter(&server).with_page_cap(3);
    let set = set_for(&server, "Loop", "Loop");
    let cards = adapter.cards_in_set(&set).await;

    assert_eq!(cards.len(), 3, "exactly one card per page up to the cap");
}

#[tokio::test]
async fn inline_tiles_need_no_detail_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sets/151/Scarlet"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="card-image-grid-item">
                    <a href="/cards/1/Pikachu-Card-25">
                        <img data-src="/images/025.jpg" src="placeholder.gif" alt="Pikachu">
                        <span class="card-number">#25/165</span>
                    </a>
                </div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = SiteAdapter::with_base(
        SiteProfile::for_source(Source::Tcgcollector),
        Language::En,
        fast_client(),
        &server.uri(),
    )
    .expect("mock server URI must parse");

    let set = SetDescriptor {
        name: "Scarlet".to_string(),
        code: "Scarlet".to_string(),
        url: format!("{}/sets/151/Scarlet", server.uri()),
        source: Source::Tcgcollector,
        language: Language::En,
    };
    let cards = adapter.cards_in_set(&set).await;

    assert_eq!(cards.len(), 1, "tile data is enough, no detail page fetched");
    assert_eq!(cards[0].name, "Pikachu");
    assert_eq!(cards[0].number, "025");
    assert!(cards[0].image_url.ends_with("/images/025.jpg"));
}
