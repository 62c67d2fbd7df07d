// src/api.rs
//! HTTP surface: health, JSON search envelope, presentation view.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::pipeline::{Aggregator, SearchPage, SearchQuery, SearchView};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", get(api_search))
        .route("/search", get(search_view))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// `/api/search?termo=...&page=2&per_page=12&source=g1`
async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<SearchPage> {
    let q = parse_query(&params);
    Json(state.aggregator.search(&q).await.page)
}

/// Same query, plus sentiment counts for a rendering layer.
async fn search_view(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<SearchView> {
    let q = parse_query(&params);
    Json(state.aggregator.search(&q).await)
}

/// Lenient parameter parsing: bad numbers become `None` (defaults later),
/// `termo`/`term`/`q` are accepted for the search term, `sources` may repeat.
pub fn parse_query(params: &[(String, String)]) -> SearchQuery {
    let mut q = SearchQuery::default();
    for (k, v) in params {
        let v = v.trim();
        match k.as_str() {
            "termo" | "term" | "q" | "palavra_chave" if q.term.is_empty() => q.term = v.to_string(),
            "page" => q.page = v.parse::<usize>().ok().filter(|n| *n >= 1),
            "per_page" => q.per_page = v.parse::<usize>().ok().filter(|n| *n >= 1),
            "source" if !v.is_empty() => q.source = Some(v.to_string()),
            "sources" if !v.is_empty() => q.sources.push(v.to_string()),
            _ => {}
        }
    }
    q
}
