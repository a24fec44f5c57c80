//! Integration tests for the refresh cycle
//!
//! These tests run the real service against a wiremock archive and verify
//! the crawl/dedup behavior end-to-end.

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use strippi::config::{HttpConfig, SiteConfig};
use strippi::crawl::CrawlEngine;
use strippi::fetch::{build_http_client, PageFetcher, SiteFetcher};
use strippi::images::ImageStore;
use strippi::index::Index;
use strippi::service::ComicService;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn frontpage_html(cards: &[(&str, &str)]) -> String {
    let cards = cards
        .iter()
        .map(|(name, homepage)| {
            format!(
                r#"<div class="cartoon-content">
                   <span class="title">{}</span>
                   <meta itemprop="contentUrl" content="{}" />
                   </div>"#,
                name, homepage
            )
        })
        .collect::<String>();
    format!("<html><body>{}</body></html>", cards)
}

fn homepage_html(latest_path: &str) -> String {
    format!(
        r#"<html><body><figure>
           <meta itemprop="contentUrl" content="{}" />
           </figure></body></html>"#,
        latest_path
    )
}

fn strip_html(date_text: &str, image_url: &str, prev: Option<&str>) -> String {
    let prev_link = prev
        .map(|p| format!(r#"<a class="article-navlink prev" href="{}">Edellinen</a>"#, p))
        .unwrap_or_default();
    format!(
        r#"<html><body>
           <span class="date">{}</span>
           <img data-srcset="{} 1920w" />
           {}
           </body></html>"#,
        date_text, image_url, prev_link
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_strip(
    server: &MockServer,
    page_path: &str,
    date_text: &str,
    image_path: &str,
    prev: Option<&str>,
) {
    let image_url = format!("{}{}", server.uri(), image_path);
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_response(strip_html(date_text, &image_url, prev)))
        .mount(server)
        .await;
}

/// Wires a real service against the mock archive
fn make_service(base_url: &str, data_dir: &Path) -> (ComicService, Index) {
    let index = Index::open(&data_dir.join("comics.db")).expect("Failed to open index");

    let client = build_http_client(&HttpConfig {
        user_agent: "strippi-test/1.0".to_string(),
        timeout_seconds: 5,
        connect_timeout_seconds: 5,
    })
    .expect("Failed to build client");

    let site = SiteConfig {
        base_url: base_url.to_string(),
        comics_path: "/sarjakuvat/".to_string(),
    };
    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(SiteFetcher::new(client, &site).expect("Failed to build fetcher"));

    let images =
        Arc::new(ImageStore::new(data_dir.join("images")).expect("Failed to open image store"));
    let engine = CrawlEngine::new(fetcher.clone(), index.clone(), images, None);

    (ComicService::new(index.clone(), engine, fetcher), index)
}

#[tokio::test]
async fn test_first_refresh_indexes_full_history() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/"))
        .respond_with(html_response(frontpage_html(&[(
            "Fok_It",
            "/sarjakuvat/fokit",
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-5.html")))
        .mount(&server)
        .await;

    // Three-strip history: 5.1. (latest) -> 4.1. -> 3.1. (start of history)
    mount_strip(&server, "/fokit/art-5.html", "5.1.2024", "/img/5.jpg", Some("/fokit/art-4.html")).await;
    mount_strip(&server, "/fokit/art-4.html", "4.1.2024", "/img/4.jpg", Some("/fokit/art-3.html")).await;
    mount_strip(&server, "/fokit/art-3.html", "3.1.2024", "/img/3.jpg", None).await;
    for img in ["/img/5.jpg", "/img/4.jpg", "/img/3.jpg"] {
        Mock::given(method("GET"))
            .and(path(img))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"strip".to_vec()))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let (service, index) = make_service(&server.uri(), dir.path());

    let report = service.refresh_all().await.expect("Refresh failed");

    assert_eq!(report.sources, 1);
    assert_eq!(report.new_entries, 3);
    assert_eq!(report.failures, 0);
    assert_eq!(
        index.latest_entry_date("Fok_It").await.unwrap(),
        Some(date(2024, 1, 5))
    );

    // The stored image is readable through its recorded reference
    let entry = service
        .post_for_date("Fok_It", date(2024, 1, 4))
        .await
        .unwrap()
        .expect("Entry should exist");
    assert!(Path::new(&entry.image_ref).exists());
}

#[tokio::test]
async fn test_second_refresh_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/"))
        .respond_with(html_response(frontpage_html(&[(
            "Fok_It",
            "/sarjakuvat/fokit",
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-2.html")))
        .mount(&server)
        .await;
    mount_strip(&server, "/fokit/art-2.html", "4.1.2024", "/img/2.jpg", Some("/fokit/art-1.html")).await;
    mount_strip(&server, "/fokit/art-1.html", "3.1.2024", "/img/1.jpg", None).await;

    // Each image must be downloaded exactly once across both refreshes
    for img in ["/img/2.jpg", "/img/1.jpg"] {
        Mock::given(method("GET"))
            .and(path(img))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"strip".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let (service, _index) = make_service(&server.uri(), dir.path());

    let first = service.refresh_all().await.expect("First refresh failed");
    assert_eq!(first.new_entries, 2);

    let second = service.refresh_all().await.expect("Second refresh failed");
    assert_eq!(second.new_entries, 0);
    assert_eq!(second.failures, 0);

    // Dropping the server verifies the expect(1) counts
}

#[tokio::test]
async fn test_incremental_refresh_stops_at_indexed_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/"))
        .respond_with(html_response(frontpage_html(&[(
            "Fok_It",
            "/sarjakuvat/fokit",
        )])))
        .mount(&server)
        .await;

    // The homepage points at art-4 for the first refresh only; afterwards a
    // newer strip (art-5) has been published.
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-4.html")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-5.html")))
        .mount(&server)
        .await;

    mount_strip(&server, "/fokit/art-5.html", "5.1.2024", "/img/5.jpg", Some("/fokit/art-4.html")).await;
    mount_strip(&server, "/fokit/art-4.html", "4.1.2024", "/img/4.jpg", Some("/fokit/art-3.html")).await;
    mount_strip(&server, "/fokit/art-3.html", "3.1.2024", "/img/3.jpg", None).await;
    for img in ["/img/5.jpg", "/img/4.jpg", "/img/3.jpg"] {
        Mock::given(method("GET"))
            .and(path(img))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"strip".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let (service, index) = make_service(&server.uri(), dir.path());

    // First refresh indexes 4.1. and 3.1.
    let first = service.refresh_all().await.expect("First refresh failed");
    assert_eq!(first.new_entries, 2);

    // Second refresh walks from art-5, writes exactly the one new strip and
    // stops at the already-indexed 4.1. without refetching its image.
    let second = service.refresh_all().await.expect("Second refresh failed");
    assert_eq!(second.new_entries, 1);
    assert_eq!(
        index.latest_entry_date("Fok_It").await.unwrap(),
        Some(date(2024, 1, 5))
    );
}

#[tokio::test]
async fn test_broken_source_does_not_stop_the_pass() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/"))
        .respond_with(html_response(frontpage_html(&[
            ("Broken", "/sarjakuvat/broken"),
            ("Fok_It", "/sarjakuvat/fokit"),
        ])))
        .mount(&server)
        .await;

    // The broken source's homepage has lost its figure element
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/broken"))
        .respond_with(html_response("<html><body></body></html>".to_string()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-1.html")))
        .mount(&server)
        .await;
    mount_strip(&server, "/fokit/art-1.html", "3.1.2024", "/img/1.jpg", None).await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"strip".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (service, index) = make_service(&server.uri(), dir.path());

    let report = service.refresh_all().await.expect("Refresh failed");

    assert_eq!(report.sources, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(report.new_entries, 1);
    assert_eq!(
        index.latest_entry_date("Fok_It").await.unwrap(),
        Some(date(2024, 1, 3))
    );
}

#[tokio::test]
async fn test_post_today_after_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sarjakuvat/"))
        .respond_with(html_response(frontpage_html(&[(
            "Fok_It",
            "/sarjakuvat/fokit",
        )])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sarjakuvat/fokit"))
        .respond_with(html_response(homepage_html("/fokit/art-1.html")))
        .mount(&server)
        .await;
    mount_strip(&server, "/fokit/art-1.html", "5.1.2024", "/img/1.jpg", None).await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"strip".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (service, _index) = make_service(&server.uri(), dir.path());

    // Nothing to post before the refresh: a normal empty outcome
    assert!(service
        .post_for_date("Fok_It", date(2024, 1, 5))
        .await
        .unwrap()
        .is_none());

    service.refresh_all().await.expect("Refresh failed");

    let entry = service
        .post_for_date("Fok_It", date(2024, 1, 5))
        .await
        .unwrap()
        .expect("Entry should exist after refresh");
    assert_eq!(entry.source_name, "Fok_It");

    // Subscribed destinations get exactly this entry in the daily pass
    service.subscribe(42, "Fok_It").await.unwrap();
    let posts = service.daily_posts_for_date(date(2024, 1, 5)).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].destination_id, 42);
    assert_eq!(posts[0].entry.date, date(2024, 1, 5));

    // Random pick also has something to serve now
    assert!(service.post_random("Fok_It").await.unwrap().is_some());
}

#[tokio::test]
async fn test_random_pick_on_empty_source_is_none() {
    let dir = TempDir::new().unwrap();
    let (service, index) = make_service("http://127.0.0.1:1", dir.path());

    index
        .upsert_source("Fok_It", "http://127.0.0.1:1/fokit")
        .await
        .unwrap();

    assert!(service.post_random("Fok_It").await.unwrap().is_none());
    assert!(!service.is_subscribed(1, "Fok_It").await.unwrap());
}
