//! HTTP search API
//!
//! Exposes `GET /api/search?q=&page=&pagesize=` returning the JSON form of
//! [`SearchResult`]. Queries run on the blocking pool because SQLite access
//! is synchronous.

use crate::search::engine::{search, SearchResult};
use crate::search::tokenizer::Tokenizer;
use crate::search::SearchError;
use crate::storage::{lock, SharedStorage};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

/// Shared state for axum handlers
#[derive(Clone)]
pub struct AppState {
    /// Connection dedicated to serving queries
    pub storage: SharedStorage,
    /// Segmenter shared with the indexer
    pub tokenizer: Arc<dyn Tokenizer>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_page_size")]
    pagesize: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// Builds the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", get(handle_search))
        .with_state(state)
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>, ApiError> {
    let result = tokio::task::spawn_blocking(move || {
        let storage = lock(&state.storage)?;
        search(
            &*storage,
            state.tokenizer.as_ref(),
            &params.q,
            params.page,
            params.pagesize,
        )
    })
    .await
    .map_err(|e| SearchError::Task(e.to_string()))??;

    Ok(Json(result))
}

/// Search failure surfaced as HTTP 500
struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("Search request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal search error" })),
        )
            .into_response()
    }
}

/// Running search API server
pub struct SearchServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl SearchServer {
    /// Binds `bind` and starts serving in a background task
    ///
    /// Use port `0` to let the OS pick a free port.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(bind: &str, state: AppState) -> crate::Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let app = router(state);

        info!("Search API listening on http://{}/api/search", addr);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Search server error: {}", e);
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Aborts the server task
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
