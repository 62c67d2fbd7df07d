// src/pipeline.rs
//! One search run: fan out to every source, merge with first-seen-wins
//! deduplication on the canonical link, stamp sentiment once per survivor,
//! optionally persist, then filter and paginate for presentation.

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::{AppConfig, PipelineConfig};
use crate::extract::SourceExtractor;
use crate::persist::ArticleStore;
use crate::sentiment::SentimentClassifier;
use crate::types::{Article, Sentiment, StampedArticle};

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Aggregation runs.");
        describe_counter!(
            "pipeline_duplicates_total",
            "Articles dropped because an earlier source had the same link."
        );
        describe_counter!("extract_candidates_total", "Anchors collected from markup.");
        describe_counter!("extract_admitted_total", "Articles returned by extractors.");
        describe_counter!(
            "extract_rejected_total",
            "Candidates dropped by normalization or plausibility."
        );
        describe_counter!(
            "extract_strategy_errors_total",
            "Fetch/render/parse failures per strategy."
        );
        describe_counter!("extract_fallback_total", "Escalations to the rendered fallback.");
        describe_counter!(
            "sentiment_translation_failures_total",
            "Titles scored untranslated."
        );
        describe_counter!("persist_failures_total", "Article rows the store failed to write.");
        describe_histogram!("extract_ms", "Strategy run time in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when a run last finished.");
    });
}

/// Inbound search request. Numbers are already parsed; clamping happens here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub term: String,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    /// Case-insensitive substring on the source name.
    pub source: Option<String>,
    /// Any-of list; wins over `source` when non-empty.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Paginated result envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub term: String,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub results: Vec<StampedArticle>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn tally(articles: &[StampedArticle]) -> Self {
        let mut c = Self::default();
        for a in articles {
            match a.sentiment {
                Sentiment::Positive => c.positive += 1,
                Sentiment::Negative => c.negative += 1,
                Sentiment::Neutral => c.neutral += 1,
            }
        }
        c
    }
}

/// What the presentation layer receives: the page plus counts over the whole
/// merged set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchView {
    #[serde(flatten)]
    pub page: SearchPage,
    pub sentiments: SentimentCounts,
    pub source_filter: Vec<String>,
}

pub struct Aggregator {
    extractors: Vec<SourceExtractor>,
    classifier: SentimentClassifier,
    store: Option<Arc<dyn ArticleStore>>,
    settings: PipelineConfig,
}

impl Aggregator {
    pub fn new(
        extractors: Vec<SourceExtractor>,
        classifier: SentimentClassifier,
        store: Option<Arc<dyn ArticleStore>>,
        settings: PipelineConfig,
    ) -> Self {
        ensure_metrics_described();
        Self {
            extractors,
            classifier,
            store,
            settings,
        }
    }

    /// Production wiring from configuration.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let extractors = crate::extract::build_extractors(cfg)?;
        let classifier = SentimentClassifier::from_config(&cfg.translation);
        let store: Option<Arc<dyn ArticleStore>> = if cfg.pipeline.persist {
            Some(Arc::new(crate::persist::JsonlStore::new(
                cfg.pipeline.store_path.clone(),
            )))
        } else {
            None
        };
        Ok(Self::new(extractors, classifier, store, cfg.pipeline.clone()))
    }

    pub fn source_names(&self) -> Vec<String> {
        self.extractors.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    /// Deduplicated, sentiment-stamped articles for `term` across all sources.
    pub async fn aggregate(&self, term: &str) -> Vec<StampedArticle> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }
        let t0 = Instant::now();

        // Sources are independent; join_all keeps configuration order for the merge.
        let batches: Vec<Vec<Article>> = futures::future::join_all(
            self.extractors
                .iter()
                .map(|e| e.extract(term, e.default_limit())),
        )
        .await;

        let extracted: usize = batches.iter().map(Vec::len).sum();
        let merged = merge(batches);
        counter!("pipeline_duplicates_total").increment((extracted - merged.len()) as u64);

        let stamped = self.stamp(merged).await;

        if let Some(store) = &self.store {
            if let Err(e) = store.store(term, &stamped).await {
                warn!(error = ?e, store = store.name(), "persisting results failed");
            }
        }

        counter!("pipeline_runs_total").increment(1);
        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        info!(
            term,
            extracted,
            kept = stamped.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "aggregation finished"
        );
        stamped
    }

    /// Sentiment once per merged article, order preserved.
    async fn stamp(&self, merged: Vec<Article>) -> Vec<StampedArticle> {
        let classifier = &self.classifier;
        stream::iter(merged)
            .map(|article| async move {
                let sentiment = classifier.classify(&article.title).await;
                StampedArticle { article, sentiment }
            })
            .buffered(self.settings.sentiment_concurrency.max(1))
            .collect()
            .await
    }

    /// Full request: aggregate, then filter, paginate and count.
    pub async fn search(&self, q: &SearchQuery) -> SearchView {
        let merged = self.aggregate(&q.term).await;
        self.present(q, merged)
    }

    /// Filter/paginate an already aggregated set.
    pub fn present(&self, q: &SearchQuery, merged: Vec<StampedArticle>) -> SearchView {
        let sentiments = SentimentCounts::tally(&merged);
        let filters = active_filters(q);
        let filtered = filter_by_sources(merged, &filters);

        let per_page = q
            .per_page
            .filter(|n| *n >= 1)
            .unwrap_or(self.settings.default_per_page)
            .min(self.settings.max_per_page.max(1));
        let page = paginate(filtered, q.page.unwrap_or(1), per_page);

        SearchView {
            page: SearchPage {
                term: q.term.trim().to_string(),
                ..page
            },
            sentiments,
            source_filter: filters,
        }
    }
}

/// Concatenate batches in order, keeping the first article per canonical link.
pub fn merge(batches: Vec<Vec<Article>>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|a| seen.insert(a.link.clone()))
        .collect()
}

fn active_filters(q: &SearchQuery) -> Vec<String> {
    let list: Vec<String> = q
        .sources
        .iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !list.is_empty() {
        return list;
    }
    q.source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| vec![s.to_string()])
        .unwrap_or_default()
}

/// Keep articles whose source name contains any of `filters`
/// (case-insensitive). No filters keeps everything.
pub fn filter_by_sources(articles: Vec<StampedArticle>, filters: &[String]) -> Vec<StampedArticle> {
    if filters.is_empty() {
        return articles;
    }
    let needles: Vec<String> = filters.iter().map(|f| f.to_lowercase()).collect();
    articles
        .into_iter()
        .filter(|a| {
            let name = a.article.source.to_lowercase();
            needles.iter().any(|n| name.contains(n.as_str()))
        })
        .collect()
}

/// Slice one page. `page` is clamped into `[1, total_pages]`; an empty set has
/// one empty page. `per_page` below 1 is treated as 1.
pub fn paginate(items: Vec<StampedArticle>, page: usize, per_page: usize) -> SearchPage {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let results = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    SearchPage {
        term: String::new(),
        page,
        per_page,
        total,
        total_pages,
        results,
    }
}
