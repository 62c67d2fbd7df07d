// src/persist.rs
//! Persistence port: completed, stamped results keyed by search term.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::types::StampedArticle;

#[async_trait::async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store one run's articles. Individual row failures are absorbed by the
    /// implementation; `Err` only means the store could not be used at all.
    async fn store(&self, term: &str, articles: &[StampedArticle]) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// One persisted row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredArticle {
    pub term: String,
    #[serde(flatten)]
    pub article: StampedArticle,
    pub stored_at: String,
}

/// Appends one JSON line per article.
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ArticleStore for JsonlStore {
    async fn store(&self, term: &str, articles: &[StampedArticle]) -> Result<()> {
        if articles.is_empty() {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;

        let stored_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut written = 0usize;
        for a in articles {
            let row = StoredArticle {
                term: term.to_string(),
                article: a.clone(),
                stored_at: stored_at.clone(),
            };
            let line = match serde_json::to_string(&row) {
                Ok(mut l) => {
                    l.push('\n');
                    l
                }
                Err(e) => {
                    counter!("persist_failures_total").increment(1);
                    warn!(error = %e, link = %a.article.link, "serializing row failed");
                    continue;
                }
            };
            if let Err(e) = file.write_all(line.as_bytes()).await {
                counter!("persist_failures_total").increment(1);
                warn!(error = %e, link = %a.article.link, "writing row failed");
                continue;
            }
            written += 1;
        }
        if let Err(e) = file.flush().await {
            warn!(error = %e, "flushing store failed");
        }
        debug!(term, written, path = %self.path.display(), "stored articles");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// Keeps rows in memory (tests, dry runs).
#[derive(Default)]
pub struct MemoryStore {
    pub rows: std::sync::Mutex<Vec<(String, StampedArticle)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ArticleStore for MemoryStore {
    async fn store(&self, term: &str, articles: &[StampedArticle]) -> Result<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        rows.extend(articles.iter().map(|a| (term.to_string(), a.clone())));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
