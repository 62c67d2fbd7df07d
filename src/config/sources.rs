// src/config/sources.rs
use serde::Deserialize;

/// One configured news source. Selector lists are replaceable data; they go
/// stale whenever the source redesigns its pages.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Search page URL with a `{query}` placeholder.
    pub search_url: String,
    /// Origin used to resolve relative links, e.g. `https://g1.globo.com`.
    #[serde(default)]
    pub preferred_domain: Option<String>,
    #[serde(default)]
    pub accept_language: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
    /// Minimum pause between two outbound requests to this source.
    #[serde(default)]
    pub min_interval_ms: u64,
    /// Result-block selectors; the first one that matches anything wins and
    /// the first anchor of each block becomes a candidate.
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Anchor selectors, most specific first. All matches are unioned.
    #[serde(default)]
    pub anchors: Vec<String>,
    /// Title element selectors searched inside the anchor, then its block.
    #[serde(default)]
    pub title_selectors: Vec<String>,
}

fn default_limit() -> usize {
    12
}
fn default_fallback_limit() -> usize {
    8
}

impl SourceConfig {
    pub(crate) fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        if self.limit == 0 {
            self.limit = default_limit();
        }
        // The rendered path is a degraded mode: strictly fewer results than
        // the primary path, except for a single-result source.
        if self.fallback_limit == 0 {
            self.fallback_limit = default_fallback_limit();
        }
        let cap = self.limit.saturating_sub(1).max(1);
        self.fallback_limit = self.fallback_limit.min(cap);
        self.preferred_domain = self
            .preferred_domain
            .take()
            .map(|d| d.trim().trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty());
        for list in [&mut self.blocks, &mut self.anchors, &mut self.title_selectors] {
            list.retain(|s| !s.trim().is_empty());
        }
    }
}

/// Host/path tables shared by the link normalizer and plausibility classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTables {
    /// Social, shortener and meeting hosts that never carry articles.
    #[serde(default = "default_denied_hosts")]
    pub denied_hosts: Vec<String>,
    /// Click-tracking / internal search endpoints rejected by the normalizer.
    #[serde(default = "default_tracking_markers")]
    pub tracking_markers: Vec<String>,
    /// General web-search hosts whose own pages are not articles.
    #[serde(default = "default_search_engine_hosts")]
    pub search_engine_hosts: Vec<String>,
    /// Link fragments that mark search/click/query endpoints.
    #[serde(default = "default_noise_markers")]
    pub noise_markers: Vec<String>,
    #[serde(default = "default_article_path_markers")]
    pub article_path_markers: Vec<String>,
    #[serde(default = "default_article_hosts")]
    pub article_hosts: Vec<String>,
}

fn default_denied_hosts() -> Vec<String> {
    [
        "facebook.com",
        "twitter.com",
        "t.co",
        "instagram.com",
        "youtube.com",
        "accounts.google.com",
        "linkedin.com",
        "bit.ly",
        "tinyurl.com",
        "meet.google.com",
    ]
    .map(String::from)
    .to_vec()
}
fn default_tracking_markers() -> Vec<String> {
    vec!["busca/click".into(), "/busca?".into()]
}
fn default_search_engine_hosts() -> Vec<String> {
    vec!["google.".into()]
}
fn default_noise_markers() -> Vec<String> {
    ["busca", "click", "/search", "query="].map(String::from).to_vec()
}
fn default_article_path_markers() -> Vec<String> {
    vec!["/noticia/".into()]
}
fn default_article_hosts() -> Vec<String> {
    vec!["g1.globo.com".into()]
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            denied_hosts: default_denied_hosts(),
            tracking_markers: default_tracking_markers(),
            search_engine_hosts: default_search_engine_hosts(),
            noise_markers: default_noise_markers(),
            article_path_markers: default_article_path_markers(),
            article_hosts: default_article_hosts(),
        }
    }
}
