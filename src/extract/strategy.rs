// src/extract/strategy.rs
//! Interchangeable ways of turning a source's search page into articles.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::fetch::PageFetcher;
use super::harvest::{harvest, CandidateFilter, SourceProfile};
use super::pacing::Pacer;
use crate::types::Article;

/// Everything a strategy needs to know about the source it runs against.
pub struct SourceContext {
    pub profile: SourceProfile,
    pub filter: Arc<CandidateFilter>,
    pub pacer: Pacer,
}

#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Articles found for `term`, at most `limit`. Errors mean "this strategy
    /// produced nothing"; the extractor decides what happens next.
    async fn run(&self, ctx: &SourceContext, term: &str, limit: usize) -> Result<Vec<Article>>;
}

/// Primary path: one timed GET of the search page, parsed as served.
pub struct StructuredFetch {
    fetcher: Arc<dyn PageFetcher>,
}

impl StructuredFetch {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for StructuredFetch {
    fn kind(&self) -> &'static str {
        "structured"
    }

    async fn run(&self, ctx: &SourceContext, term: &str, limit: usize) -> Result<Vec<Article>> {
        let url = ctx.profile.search_url_for(term);
        ctx.pacer.wait().await;
        let html = self
            .fetcher
            .fetch(&url, ctx.profile.accept_language.as_deref())
            .await?;
        Ok(harvest(&html, &ctx.profile, &ctx.filter, limit))
    }
}

/// Degraded path: render the page in a headless browser so script-built
/// results become visible, then apply the same harvesting with a smaller cap.
pub struct RenderedFetch {
    renderer: Arc<dyn PageFetcher>,
    timeout: Duration,
}

impl RenderedFetch {
    pub fn new(renderer: Arc<dyn PageFetcher>, timeout: Duration) -> Self {
        Self { renderer, timeout }
    }
}

#[async_trait]
impl ExtractionStrategy for RenderedFetch {
    fn kind(&self) -> &'static str {
        "rendered"
    }

    async fn run(&self, ctx: &SourceContext, term: &str, limit: usize) -> Result<Vec<Article>> {
        let url = ctx.profile.search_url_for(term);
        let cap = limit.min(ctx.profile.fallback_limit);
        ctx.pacer.wait().await;
        let html = tokio::time::timeout(
            self.timeout,
            self.renderer
                .fetch(&url, ctx.profile.accept_language.as_deref()),
        )
        .await
        .map_err(|_| anyhow!("render of {url} timed out after {:?}", self.timeout))??;
        Ok(harvest(&html, &ctx.profile, &ctx.filter, cap))
    }
}
