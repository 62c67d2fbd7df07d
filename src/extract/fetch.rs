// src/extract/fetch.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::HttpConfig;

/// Turns a URL into page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, accept_language: Option<&str>) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Plain timed GET with a browser-like User-Agent.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(cfg: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, accept_language: Option<&str>) -> Result<String> {
        let mut req = self.client.get(url);
        if let Some(lang) = accept_language {
            req = req.header(reqwest::header::ACCEPT_LANGUAGE, lang);
        }
        let resp = req.send().await.with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("GET {url} returned {status}"));
        }
        resp.text().await.context("reading response body")
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves canned markup instead of touching the network. Counts calls so
/// strategy escalation can be observed.
pub struct FixtureFetcher {
    default_body: Option<String>,
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    /// Same body for every URL.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            default_body: Some(body.into()),
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every request, like an unreachable host.
    pub fn failing() -> Self {
        Self {
            default_body: None,
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `body` for exactly `url`; other URLs fall back to the default.
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, _accept_language: Option<&str>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .or(self.default_body.as_ref())
            .cloned()
            .ok_or_else(|| anyhow!("no fixture for {url}"))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
