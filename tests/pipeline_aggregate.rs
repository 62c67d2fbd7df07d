// tests/pipeline_aggregate.rs
//
// End-to-end aggregation over fixture-backed sources: merge order, dedup,
// one sentiment per survivor, persistence after the merge, presentation.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use news_pulse::config::AppConfig;
use news_pulse::extract::{CandidateFilter, FixtureFetcher, SourceExtractor};
use news_pulse::persist::{ArticleStore, MemoryStore};
use news_pulse::pipeline::merge;
use news_pulse::sentiment::{Passthrough, SentimentClassifier, Translator};
use news_pulse::{Aggregator, Article, SearchQuery, StampedArticle};

const G1_HTML: &str = include_str!("fixtures/g1_search.html");
const GOOGLE_HTML: &str = include_str!("fixtures/google_news.html");

fn extractors() -> (Vec<SourceExtractor>, Arc<FixtureFetcher>, Arc<FixtureFetcher>) {
    let cfg = AppConfig::embedded();
    let filter = Arc::new(CandidateFilter::new(&cfg.rules));
    let g1 = Arc::new(FixtureFetcher::new(G1_HTML));
    let google = Arc::new(FixtureFetcher::new(GOOGLE_HTML));
    let list = vec![
        SourceExtractor::from_config(&cfg.sources[0], filter.clone(), g1.clone(), None),
        SourceExtractor::from_config(&cfg.sources[1], filter, google.clone(), None),
    ];
    (list, g1, google)
}

fn aggregator(store: Option<Arc<dyn ArticleStore>>) -> Aggregator {
    let (list, _, _) = extractors();
    Aggregator::new(
        list,
        SentimentClassifier::new(Arc::new(Passthrough)),
        store,
        AppConfig::embedded().pipeline,
    )
}

fn article(source: &str, link: &str) -> Article {
    Article {
        title: format!("Manchete publicada por {source}"),
        link: link.to_string(),
        source_link: None,
        source: source.to_string(),
    }
}

#[test]
fn first_source_wins_a_shared_link() {
    let merged = merge(vec![
        vec![article("G1", "https://g1.globo.com/a")],
        vec![
            article("Google News", "https://g1.globo.com/a"),
            article("Google News", "https://g1.globo.com/b"),
        ],
    ]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].source, "G1");
    assert_eq!(merged[1].link, "https://g1.globo.com/b");
}

#[tokio::test]
async fn aggregate_merges_sources_in_configuration_order() {
    let agg = aggregator(None);
    let got = agg.aggregate("eleições").await;

    let links: Vec<&str> = got.iter().map(|a| a.article.link.as_str()).collect();
    let unique: HashSet<&str> = links.iter().copied().collect();
    assert_eq!(unique.len(), links.len(), "dedup invariant");
    assert_eq!(got.len(), 6);

    let sources: Vec<&str> = got.iter().map(|a| a.article.source.as_str()).collect();
    assert_eq!(sources, vec!["G1", "G1", "G1", "G1", "Google News", "Google News"]);

    // the TSE story appears on both pages; G1 ran first
    let tse: Vec<&StampedArticle> = got
        .iter()
        .filter(|a| a.article.link.contains("tse-divulga-calendario"))
        .collect();
    assert_eq!(tse.len(), 1);
    assert_eq!(tse[0].article.source, "G1");
    assert_eq!(tse[0].article.title, "TSE divulga calendário das eleições de 2026");
}

/// Passes text through and counts calls.
struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl Translator for Counting {
    async fn to_english(&self, text: &str) -> Result<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[tokio::test]
async fn sentiment_runs_once_per_merged_article() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (list, _, _) = extractors();
    let agg = Aggregator::new(
        list,
        SentimentClassifier::new(Arc::new(Counting(calls.clone()))),
        None,
        AppConfig::embedded().pipeline,
    );
    let got = agg.aggregate("eleições").await;
    assert_eq!(got.len(), 6);
    assert_eq!(calls.load(Ordering::SeqCst), 6, "7 extracted, 1 duplicate");
}

#[tokio::test]
async fn blank_term_touches_nothing() {
    let (list, g1, google) = extractors();
    let store = Arc::new(MemoryStore::new());
    let agg = Aggregator::new(
        list,
        SentimentClassifier::new(Arc::new(Passthrough)),
        Some(store.clone()),
        AppConfig::embedded().pipeline,
    );
    assert!(agg.aggregate("   ").await.is_empty());
    assert_eq!(g1.calls() + google.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn store_receives_the_complete_stamped_set() {
    let store = Arc::new(MemoryStore::new());
    let agg = aggregator(Some(store.clone()));
    let got = agg.aggregate("eleições").await;

    let rows = store.rows.lock().expect("store lock");
    assert_eq!(rows.len(), got.len());
    assert!(rows.iter().all(|(term, _)| term == "eleições"));
    let stored: Vec<&StampedArticle> = rows.iter().map(|(_, a)| a).collect();
    let returned: Vec<&StampedArticle> = got.iter().collect();
    assert_eq!(stored, returned);
}

struct BrokenStore;

#[async_trait]
impl ArticleStore for BrokenStore {
    async fn store(&self, _term: &str, _articles: &[StampedArticle]) -> Result<()> {
        Err(anyhow!("database offline"))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn store_failure_does_not_affect_results() {
    let agg = aggregator(Some(Arc::new(BrokenStore)));
    assert_eq!(agg.aggregate("eleições").await.len(), 6);
}

#[tokio::test]
async fn search_filters_paginates_and_counts() {
    let agg = aggregator(None);

    let view = agg
        .search(&SearchQuery {
            term: " eleições ".into(),
            page: Some(99),
            per_page: Some(4),
            ..Default::default()
        })
        .await;
    assert_eq!(view.page.term, "eleições");
    assert_eq!(
        (view.page.page, view.page.total, view.page.total_pages),
        (2, 6, 2)
    );
    assert_eq!(view.page.results.len(), 2);
    let c = view.sentiments;
    assert_eq!(c.positive + c.negative + c.neutral, 6);

    let view = agg
        .search(&SearchQuery {
            term: "eleições".into(),
            source: Some("GOOGLE".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(view.page.total, 2);
    assert_eq!(view.page.per_page, 12);
    assert!(view
        .page
        .results
        .iter()
        .all(|a| a.article.source == "Google News"));
    // counts still describe the whole merged set
    let c = view.sentiments;
    assert_eq!(c.positive + c.negative + c.neutral, 6);
    assert_eq!(view.source_filter, vec!["GOOGLE".to_string()]);
}

#[tokio::test]
async fn oversized_pages_are_capped() {
    let agg = aggregator(None);
    let view = agg
        .search(&SearchQuery {
            term: "eleições".into(),
            per_page: Some(10_000),
            ..Default::default()
        })
        .await;
    assert_eq!(view.page.per_page, agg.settings().max_per_page);
    assert_eq!(view.page.results.len(), 6);
}

#[test]
fn source_names_follow_configuration() {
    let agg = aggregator(None);
    assert_eq!(agg.source_names(), vec!["G1".to_string(), "Google News".to_string()]);
}
