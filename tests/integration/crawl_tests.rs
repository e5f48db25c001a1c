//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use intrasearch::config::{
    Config, CrawlerConfig, FilterConfig, LoggingConfig, ServerConfig, StorageConfig,
};
use intrasearch::crawler::{Coordinator, CrawlSummary};
use intrasearch::search::{search, JiebaTokenizer, Tokenizer};
use intrasearch::storage::{open_storage, SharedStorage, Storage};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration that admits the loopback mock server
fn create_test_config(seed: &str, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: seed.to_string(),
            max_concurrent_fetches: 4,
            request_timeout_secs: 3,
            page_deadline_secs: 10,
            user_agent: "intrasearch-test/1.0".to_string(),
        },
        filter: FilterConfig {
            institution_domain: "seu.edu.cn".to_string(),
            excluded_hosts: vec!["bbs.seu.edu.cn".to_string()],
            private_prefixes: vec!["127.0.0".to_string()],
        },
        storage: StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
        server: ServerConfig::default(),
        logging: LoggingConfig::default(),
    }
}

fn shared(db_path: &Path) -> SharedStorage {
    Arc::new(Mutex::new(
        open_storage(db_path).expect("Failed to open storage"),
    ))
}

async fn crawl(config: &Config, storage: SharedStorage) -> CrawlSummary {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(JiebaTokenizer::new());
    let coordinator =
        Coordinator::new(config, storage, tokenizer).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.to_string())
}

async fn mount_html_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("HEAD"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_indexes_linked_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_page(
        &mock_server,
        "/",
        &format!(
            r##"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href='page2'>Page 2</a>
            <a href="#top">Top</a>
            <a href="http://www.example.com/outside">Outside</a>
            <a href="http://bbs.seu.edu.cn/forum">Forum</a>
            <a href="mailto:admin@seu.edu.cn">Mail</a>
            </body></html>"##,
            base_url
        ),
    )
    .await;

    mount_html_page(
        &mock_server,
        "/page1",
        r#"<html><head><title>Library</title></head><body>
        The library opens at 9. <a href="/">Home</a></body></html>"#,
    )
    .await;

    mount_html_page(
        &mock_server,
        "/page2",
        r#"<html><head><title>Sports</title></head><body>
        <script>var library = 1;</script>The gym opens at 7.</body></html>"#,
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.committed, 3);
    assert_eq!(summary.failed, 0);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_pages().unwrap(), 3);
    assert_eq!(storage.queue_len().unwrap(), 0);

    let host = base_url.trim_start_matches("http://");
    let page1 = storage
        .get_page(&format!("{}/page1", host))
        .unwrap()
        .expect("page1 should be indexed");
    assert_eq!(page1.title, "Library");
    assert_eq!(page1.content, "Library The library opens at 9. Home");

    let page2 = storage
        .get_page(&format!("{}/page2", host))
        .unwrap()
        .expect("page2 should be indexed");
    assert!(!page2.content.contains("var"));

    // Script contents are never indexed
    let result = search(&*storage, &JiebaTokenizer::new(), "library", 1, 10).unwrap();
    assert_eq!(result.count, 1);
    let rows = result.rows.unwrap();
    assert_eq!(rows[0].standard_url, format!("{}/page1", host));
    // Title once, then title and body text again from the page content
    assert_eq!(rows[0].word_hit_count, 3);
}

#[tokio::test]
async fn test_redirect_enqueues_target() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(html("<p>stale</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    mount_html_page(&mock_server, "/new", "<title>New</title><p>moved here</p>").await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/old", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.redirected, 1);
    assert_eq!(summary.committed, 1);

    let host = base_url.trim_start_matches("http://");
    let storage = storage.lock().unwrap();
    assert!(storage.get_page(&format!("{}/old", host)).unwrap().is_none());
    let page = storage
        .get_page(&format!("{}/new", host))
        .unwrap()
        .expect("redirect target should be indexed");
    assert_eq!(page.title, "New");
}

#[tokio::test]
async fn test_redirect_to_trailing_slash_is_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/dir"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/dir/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_html_page(&mock_server, "/dir/", "<title>Directory</title><p>index</p>").await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/dir", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.redirected, 1);
    assert_eq!(summary.committed, 1);

    let host = base_url.trim_start_matches("http://");
    let page = storage
        .lock()
        .unwrap()
        .get_page(&format!("{}/dir", host))
        .unwrap()
        .expect("directory page should be indexed");
    assert_eq!(page.url, format!("{}/dir/", base_url));
    assert_eq!(page.title, "Directory");
}

#[tokio::test]
async fn test_redirect_loop_between_spellings_ends() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/a/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/a", base_url), &db_path);

    let summary = crawl(&config, shared(&db_path)).await;

    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.redirected, 2);
    assert_eq!(summary.committed, 0);
}

#[tokio::test]
async fn test_abandoned_url_is_not_dispatched_again() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_page(
        &mock_server,
        "/",
        r#"<title>Home</title><a href="/missing">Gone</a><a href="/b">B</a>"#,
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    // Slow enough that /missing has already failed when /b links to it
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            html(r#"<title>B</title><a href="/missing">Gone again</a>"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.committed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(storage.lock().unwrap().queue_len().unwrap(), 0);
}

#[tokio::test]
async fn test_non_html_is_skipped_without_download() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_page(
        &mock_server,
        "/",
        r#"<title>Home</title><a href="/report.pdf">Report</a>"#,
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.committed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(storage.lock().unwrap().count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_head_not_allowed_proceeds_to_get() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<title>Home</title><p>welcome</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let summary = crawl(&config, shared(&db_path)).await;
    assert_eq!(summary.committed, 1);
}

#[tokio::test]
async fn test_error_status_abandons_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_page(
        &mock_server,
        "/",
        r#"<title>Home</title><a href="/missing">Gone</a><a href="/broken">Broken</a>"#,
    )
    .await;

    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let storage = shared(&db_path);
    let summary = crawl(&config, storage.clone()).await;

    assert_eq!(summary.dispatched, 3);
    assert_eq!(summary.committed, 1);
    assert_eq!(summary.failed, 2);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_pages().unwrap(), 1);
    assert_eq!(storage.queue_len().unwrap(), 0);
}

#[tokio::test]
async fn test_page_deadline_cancels_slow_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<title>Slow</title>").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let mut config = create_test_config(&format!("{}/", base_url), &db_path);
    config.crawler.request_timeout_secs = 30;
    config.crawler.page_deadline_secs = 1;

    let storage = shared(&db_path);
    let start = Instant::now();
    let summary = crawl(&config, storage.clone()).await;

    assert!(start.elapsed() < Duration::from_secs(4));
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.committed, 0);
    assert_eq!(storage.lock().unwrap().count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_concurrency_ceiling_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let links: String = (0..8)
        .map(|i| format!(r#"<a href="/item{}">Item {}</a>"#, i, i))
        .collect();
    mount_html_page(&mock_server, "/", &format!("<title>Index</title>{}", links)).await;

    for i in 0..8 {
        let page_path = format!("/item{}", i);
        Mock::given(method("HEAD"))
            .and(path(page_path.as_str()))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(page_path.as_str()))
            .respond_with(
                html(&format!("<title>Item {}</title>", i))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let mut config = create_test_config(&format!("{}/", base_url), &db_path);
    config.crawler.max_concurrent_fetches = 2;

    let summary = crawl(&config, shared(&db_path)).await;

    assert_eq!(summary.dispatched, 9);
    assert_eq!(summary.committed, 9);
    assert_eq!(summary.peak_in_flight, 2);
}

#[tokio::test]
async fn test_second_run_does_not_reseed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html_page(&mock_server, "/", "<title>Home</title><p>only page</p>").await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let config = create_test_config(&format!("{}/", base_url), &db_path);

    let first = crawl(&config, shared(&db_path)).await;
    assert_eq!(first.committed, 1);

    let second = crawl(&config, shared(&db_path)).await;
    assert_eq!(second.dispatched, 0);

    let storage = open_storage(&db_path).unwrap();
    assert_eq!(storage.count_pages().unwrap(), 1);
}
