//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawl
//! sessions end-to-end through the service facade.

use contact_crawler::config::{load_config, Config, StorageBackend};
use contact_crawler::storage::ContactStore;
use contact_crawler::{CrawlService, SortField};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with small pools and short timeouts
fn create_test_config(max_depth: u32, max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_pages = max_pages;
    config.crawler.io_concurrency = 4;
    config.crawler.compute_threads = 2;
    config.crawler.shutdown_grace_secs = 5;
    config.fetcher.connect_timeout_ms = 2_000;
    config.fetcher.read_timeout_ms = 2_000;
    config.fetcher.user_agent = "TestBot/1.0".to_string();
    config.monitor.interval_secs = 1;
    config
}

fn in_memory_service(config: Config) -> CrawlService {
    let store = Arc::new(ContactStore::in_memory().expect("in-memory store"));
    CrawlService::with_store(config, store).expect("Failed to create service")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn join_within(handle: &contact_crawler::SessionHandle, secs: u64) {
    tokio::time::timeout(Duration::from_secs(secs), handle.join())
        .await
        .expect("crawl session did not finish in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Romashka</title></head><body>
            <a href="/contacts">Contacts</a>
            <a href="/about">About</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/contacts",
        r#"<html><head><title>Contacts</title></head><body>
            <p>Phone: 8 (900) 123-45-67</p>
            <p>Email: <a href="mailto:Info@Romashka.ru">Info@Romashka.ru</a></p>
            <p>Address: г. Москва, ул. Ленина, д. 5</p>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        "<html><head><title>About</title></head><body>Since 1999</body></html>",
    )
    .await;

    let service = in_memory_service(create_test_config(1, 50));
    let handle = service
        .start_session(&[format!("{}/", base)], 1, 50)
        .expect("Failed to start session");
    join_within(&handle, 10).await;

    assert_eq!(service.count(), 3);

    let contacts = service
        .records()
        .into_iter()
        .find(|r| r.url == format!("{}/contacts", base))
        .expect("contacts page should be stored");
    assert_eq!(contacts.title.as_deref(), Some("Contacts"));
    assert!(contacts.phones.contains("+79001234567"));
    assert!(contacts.emails.contains("info@romashka.ru"));
    assert_eq!(contacts.emails.len(), 1);
    assert_eq!(contacts.addresses.len(), 1);

    let status = service.status();
    assert_eq!(status.active_tasks, 0);
    assert_eq!(status.processing_count, 0);
    assert_eq!(status.visited_count, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cyclic_links_fetched_once() {
    let server = MockServer::start().await;

    mount_page(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#).await;
    for (route, other) in [("/a", "/b"), ("/b", "/a")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(&format!(
                r#"<a href="{}">other</a><a href="{}">self</a>"#,
                other, route
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let service = in_memory_service(create_test_config(3, 50));
    let handle = service
        .start_session(&[format!("{}/", server.uri())], 3, 50)
        .unwrap();
    join_within(&handle, 10).await;

    assert_eq!(service.count(), 3);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/next">next</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("never"))
        .expect(0)
        .mount(&server)
        .await;

    let service = in_memory_service(create_test_config(0, 50));
    let handle = service
        .start_session(&[format!("{}/", server.uri())], 0, 50)
        .unwrap();
    join_within(&handle, 10).await;

    assert_eq!(service.count(), 1);
    assert_eq!(service.status().visited_count, 0);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_page_budget_is_a_soft_upper_bound() {
    let server = MockServer::start().await;

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links).await;
    for i in 0..20 {
        mount_page(&server, &format!("/p{}", i), &links).await;
    }

    let max_pages = 5;
    let config = create_test_config(3, max_pages);
    let io_concurrency = config.crawler.io_concurrency;
    let service = in_memory_service(config);
    let handle = service
        .start_session(&[format!("{}/", server.uri())], 3, max_pages)
        .unwrap();
    join_within(&handle, 10).await;

    let status = service.status();
    assert!(
        status.visited_count <= max_pages + io_concurrency,
        "visited {} exceeds soft bound",
        status.visited_count
    );
    assert!(service.count() <= 1 + max_pages + io_concurrency);
    assert!(service.count() >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_fetches_release_claims() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/missing">gone</a><a href="/broken">broken</a><a href="/ok">ok</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<title>OK</title>").await;

    let service = in_memory_service(create_test_config(1, 50));
    let handle = service
        .start_session(&[format!("{}/", server.uri())], 1, 50)
        .unwrap();
    join_within(&handle, 10).await;

    let urls: Vec<String> = service.records().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![format!("{}/", server.uri()), format!("{}/ok", server.uri())]
    );

    let status = service.status();
    assert_eq!(status.processing_count, 0);
    assert_eq!(status.active_tasks, 0);
    assert_eq!(status.visited_count, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recrawl_replaces_record() {
    let server = MockServer::start().await;
    let seed = format!("{}/contacts", server.uri());

    mount_page(
        &server,
        "/contacts",
        "<p>8-900-123-45-67, +7 (999) 123-45-67, sales@shop.ru</p>",
    )
    .await;

    let service = in_memory_service(create_test_config(0, 10));
    let first = service.start_session(&[seed.clone()], 0, 10).unwrap();
    join_within(&first, 10).await;
    assert_eq!(service.records()[0].phones.len(), 2);

    server.reset().await;
    mount_page(&server, "/contacts", "<p>Moved. Call 8-900-123-45-67</p>").await;

    let second = service.start_session(&[seed], 0, 10).unwrap();
    join_within(&second, 10).await;

    let records = service.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].phones.iter().collect::<Vec<_>>(),
        vec!["+79001234567"]
    );
    assert!(records[0].emails.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multiple_seeds_join_all_branches() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/", "<p>first@site.ru</p>").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>second@site.ru</p>").set_delay(Duration::from_millis(200)))
        .mount(&second)
        .await;

    let service = in_memory_service(create_test_config(0, 10));
    let handle = service
        .start_session(
            &[format!("{}/", first.uri()), format!("{}/", second.uri())],
            0,
            10,
        )
        .unwrap();
    assert_eq!(handle.branches().len(), 2);
    join_within(&handle, 10).await;

    assert!(handle.is_finished());
    assert_eq!(service.filtered_records("@site.ru").len(), 2);
    let by_email = service.sorted_records(SortField::EmailCount, false);
    assert!(by_email.iter().all(|r| r.email_count() == 1));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sqlite_store_persists_across_services() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>Persisted</title><p>+7 999 123 45 67</p>").await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("contacts.db");
    let config_path = dir.path().join("crawler.toml");
    {
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"
seeds = ["{}/"]

[crawler]
max-depth = 0
max-pages = 5
compute-threads = 2

[storage]
backend = "sqlite"
path = "{}"
"#,
            server.uri(),
            db_path.display()
        )
        .unwrap();
    }

    let config = load_config(&config_path).expect("config should load");
    {
        let service = CrawlService::new(config.clone()).unwrap();
        let handle = service.start_configured_session().unwrap();
        join_within(&handle, 10).await;
        service.shutdown(Duration::from_secs(1)).await;
    }

    let reopened = ContactStore::open(&config.storage).unwrap();
    let records = reopened.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title.as_deref(), Some("Persisted"));
    assert!(records[0].phones.contains("+79991234567"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_flat_file_backend_round_trip() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>Flat</title><p>flat@file.ru</p>").await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(0, 5);
    config.storage.backend = StorageBackend::FlatFile;
    config.storage.path = dir.path().join("contacts.txt").display().to_string();

    {
        let service = CrawlService::new(config.clone()).unwrap();
        let handle = service
            .start_session(&[format!("{}/", server.uri())], 0, 5)
            .unwrap();
        join_within(&handle, 10).await;
    }

    let contents = std::fs::read_to_string(&config.storage.path).unwrap();
    let fields: Vec<&str> = contents.trim_end().split('|').collect();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[2], "Flat");
    assert_eq!(fields[4], "flat@file.ru");

    let reopened = ContactStore::open(&config.storage).unwrap();
    assert_eq!(reopened.count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_then_start_is_rejected() {
    let service = in_memory_service(create_test_config(1, 5));
    service.start_monitor();
    service.shutdown(Duration::from_millis(100)).await;

    let result = service.start_session(&["https://example.com/".to_string()], 1, 5);
    assert!(matches!(
        result,
        Err(contact_crawler::CrawlerError::SessionClosed)
    ));
}
