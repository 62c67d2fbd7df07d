// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod extract;
pub mod links;
pub mod metrics;
pub mod persist;
pub mod pipeline;
pub mod plausibility;
pub mod sentiment;
pub mod title;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::links::normalize;
pub use crate::pipeline::{Aggregator, SearchPage, SearchQuery, SearchView, SentimentCounts};
pub use crate::plausibility::is_article;
pub use crate::title::resolve_title;
pub use crate::types::{Article, Sentiment, StampedArticle};
