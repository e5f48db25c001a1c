//! Integration tests for the search API
//!
//! Pages are indexed into a temporary database, then queried over HTTP
//! through a server bound to an ephemeral port.

use intrasearch::crawler::Indexer;
use intrasearch::search::{AppState, JiebaTokenizer, SearchServer, Tokenizer};
use intrasearch::storage::{open_storage, SharedStorage};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn shared(db_path: &Path) -> SharedStorage {
    Arc::new(Mutex::new(
        open_storage(db_path).expect("Failed to open storage"),
    ))
}

/// Indexes a small site and starts a server over its own connection
async fn start_server(db_path: &Path) -> SearchServer {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(JiebaTokenizer::new());

    let indexer = Indexer::new(shared(db_path), Arc::clone(&tokenizer));
    indexer
        .commit(
            "http://lib.seu.edu.cn/",
            "Library",
            "Library The library opens at 9 and closes at 22.",
        )
        .unwrap();
    indexer
        .commit(
            "http://lib.seu.edu.cn/hours",
            "Library hours",
            "Library hours Weekend hours differ.",
        )
        .unwrap();
    indexer
        .commit(
            "http://news.seu.edu.cn/2024/1.htm",
            "Campus news",
            "Campus news The new library wing opened; the library café too. Library tours daily.",
        )
        .unwrap();
    indexer
        .commit(
            "http://www.seu.edu.cn/",
            "东南大学",
            "东南大学 图书馆 开放时间",
        )
        .unwrap();

    let state = AppState {
        storage: shared(db_path),
        tokenizer,
    };
    SearchServer::start("127.0.0.1:0", state)
        .await
        .expect("Failed to start server")
}

async fn get(server: &SearchServer, query: &str) -> (u16, Value) {
    let url = format!("http://{}/api/search{}", server.addr(), query);
    let response = reqwest::get(&url).await.expect("Request failed");
    let status = response.status().as_u16();
    let body = response.text().await.expect("Failed to read body");
    let json = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_search_ranks_title_matches_first() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(&temp_dir.path().join("search.db")).await;

    let (status, json) = get(&server, "?q=library").await;
    assert_eq!(status, 200);
    assert_eq!(json["count"], 3);

    let rows = json["rows"].as_array().unwrap();
    let keys: Vec<&str> = rows
        .iter()
        .map(|r| r["standardUrl"].as_str().unwrap())
        .collect();
    assert_eq!(
        keys,
        vec!["lib.seu.edu.cn", "lib.seu.edu.cn/hours", "news.seu.edu.cn/2024/1.htm"]
    );

    let first = &rows[0];
    assert_eq!(first["url"], "http://lib.seu.edu.cn/");
    assert_eq!(first["title"], "Library");
    assert!(first["updateTime"].as_i64().unwrap() > 0);
    assert_eq!(first["wordHitCount"], 3);

    let appears = first["appears"].as_array().unwrap();
    assert!(!appears.is_empty());
    assert!(appears.len() <= 5);
    assert!(appears[0]["keyword"]
        .as_str()
        .unwrap()
        .eq_ignore_ascii_case("library"));
    assert!(appears[0]["left"].is_string());
    assert!(appears[0]["right"].is_string());
}

#[tokio::test]
async fn test_pagination_and_count_only() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(&temp_dir.path().join("search.db")).await;

    let (_, json) = get(&server, "?q=library&page=2&pagesize=2").await;
    assert_eq!(json["count"], 3);
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["standardUrl"], "news.seu.edu.cn/2024/1.htm");

    let (_, json) = get(&server, "?q=library&pagesize=0").await;
    assert_eq!(json["count"], 3);
    assert!(json.get("rows").is_none());
}

#[tokio::test]
async fn test_han_query() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(&temp_dir.path().join("search.db")).await;

    let (status, json) = get(&server, "?q=%E5%9B%BE%E4%B9%A6%E9%A6%86").await;
    assert_eq!(status, 200);
    assert_eq!(json["count"], 1);
    assert_eq!(json["rows"][0]["standardUrl"], "www.seu.edu.cn");
}

#[tokio::test]
async fn test_defaults_with_no_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(&temp_dir.path().join("search.db")).await;

    let (status, json) = get(&server, "").await;
    assert_eq!(status, 200);
    assert_eq!(json["count"], 0);
    assert_eq!(json["rows"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_parameters_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let server = start_server(&temp_dir.path().join("search.db")).await;

    let (status, _) = get(&server, "?q=library&page=first").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_store_failure_is_500() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("search.db");
    let server = start_server(&db_path).await;

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute("DROP TABLE word", []).unwrap();

    let (status, json) = get(&server, "?q=library").await;
    assert_eq!(status, 500);
    assert!(json["error"].is_string());
}
