// src/extract/mod.rs
//! Per-source extraction. Each source runs an ordered strategy chain
//! (structured fetch, then rendered fetch) and stops at the first strategy that
//! yields anything. Failures never leave this module: a source that fails
//! everywhere contributes an empty list.

pub mod fetch;
pub mod harvest;
pub mod pacing;
pub mod render;
pub mod strategy;

use anyhow::Result;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{AppConfig, SourceConfig};
use crate::types::Article;
pub use fetch::{FixtureFetcher, HttpFetcher, PageFetcher};
pub use harvest::{CandidateFilter, SourceProfile};
pub use pacing::Pacer;
pub use strategy::{ExtractionStrategy, RenderedFetch, SourceContext, StructuredFetch};

pub struct SourceExtractor {
    ctx: SourceContext,
    chain: Vec<Box<dyn ExtractionStrategy>>,
}

impl SourceExtractor {
    pub fn new(ctx: SourceContext, chain: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { ctx, chain }
    }

    /// Standard chain for a configured source: structured fetch, plus the
    /// rendered fallback when a renderer is available.
    pub fn from_config(
        cfg: &SourceConfig,
        filter: Arc<CandidateFilter>,
        fetcher: Arc<dyn PageFetcher>,
        renderer: Option<(Arc<dyn PageFetcher>, Duration)>,
    ) -> Self {
        let ctx = SourceContext {
            profile: SourceProfile::compile(cfg),
            filter,
            pacer: Pacer::new(Duration::from_millis(cfg.min_interval_ms)),
        };
        let mut chain: Vec<Box<dyn ExtractionStrategy>> =
            vec![Box::new(StructuredFetch::new(fetcher))];
        if let Some((r, timeout)) = renderer {
            chain.push(Box::new(RenderedFetch::new(r, timeout)));
        }
        Self::new(ctx, chain)
    }

    pub fn name(&self) -> &str {
        &self.ctx.profile.name
    }

    /// Primary cap from configuration.
    pub fn default_limit(&self) -> usize {
        self.ctx.profile.limit
    }

    /// Most-relevant-first articles for `term`, at most `limit`.
    pub async fn extract(&self, term: &str, limit: usize) -> Vec<Article> {
        let source = self.name();
        if term.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        for (i, strategy) in self.chain.iter().enumerate() {
            if i > 0 {
                counter!("extract_fallback_total", "source" => source.to_string()).increment(1);
                info!(source, strategy = strategy.kind(), "escalating to fallback strategy");
            }

            let t0 = Instant::now();
            let outcome = strategy.run(&self.ctx, term, limit).await;
            histogram!("extract_ms", "strategy" => strategy.kind())
                .record(t0.elapsed().as_secs_f64() * 1_000.0);

            match outcome {
                Ok(articles) if !articles.is_empty() => {
                    counter!("extract_admitted_total", "source" => source.to_string())
                        .increment(articles.len() as u64);
                    info!(
                        source,
                        strategy = strategy.kind(),
                        count = articles.len(),
                        "extracted articles"
                    );
                    return articles;
                }
                Ok(_) => {
                    info!(source, strategy = strategy.kind(), "strategy found nothing");
                }
                Err(e) => {
                    counter!("extract_strategy_errors_total", "source" => source.to_string())
                        .increment(1);
                    warn!(source, strategy = strategy.kind(), error = ?e, "strategy failed");
                }
            }
        }

        info!(source, "no articles from this source");
        Vec::new()
    }
}

/// Extractors for every configured source, in configuration order, sharing one
/// HTTP client, one rule set and (if built with `render`) one renderer.
pub fn build_extractors(cfg: &AppConfig) -> Result<Vec<SourceExtractor>> {
    let filter = Arc::new(CandidateFilter::new(&cfg.rules));
    let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&cfg.http)?);
    let renderer = render::default_renderer(&cfg.render)
        .map(|r| (r, Duration::from_secs(cfg.render.timeout_secs.max(1))));

    Ok(cfg
        .sources
        .iter()
        .map(|s| SourceExtractor::from_config(s, filter.clone(), http.clone(), renderer.clone()))
        .collect())
}
