// tests/metrics.rs
//
// One test per process: the Prometheus recorder is global.

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use news_pulse::config::AppConfig;
use news_pulse::extract::{CandidateFilter, FixtureFetcher, SourceExtractor};
use news_pulse::metrics::Metrics;
use news_pulse::sentiment::{Passthrough, SentimentClassifier};
use news_pulse::Aggregator;

const G1_HTML: &str = include_str!("fixtures/g1_search.html");

#[tokio::test]
async fn metrics_endpoint_contains_pipeline_series() {
    let metrics = Metrics::init().expect("install recorder");

    let cfg = AppConfig::embedded();
    let filter = Arc::new(CandidateFilter::new(&cfg.rules));
    let extractor = SourceExtractor::from_config(
        &cfg.sources[0],
        filter,
        Arc::new(FixtureFetcher::new(G1_HTML)),
        None,
    );
    let agg = Aggregator::new(
        vec![extractor],
        SentimentClassifier::new(Arc::new(Passthrough)),
        None,
        cfg.pipeline,
    );
    assert_eq!(agg.aggregate("eleições").await.len(), 4);

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "pipeline_runs_total",
        "pipeline_duplicates_total",
        "extract_candidates_total",
        "extract_admitted_total",
        "extract_rejected_total",
        "extract_ms",
        "pipeline_last_run_ts",
    ] {
        assert!(text.contains(needle), "missing series {needle} in:\n{text}");
    }
    assert!(text.contains(r#"source="G1""#));

    // a second recorder cannot be installed
    assert!(Metrics::init().is_err());
}
