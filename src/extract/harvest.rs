// src/extract/harvest.rs
//! Markup → articles: selector cascade, per-href dedup, title resolution,
//! link normalization and plausibility gating.

use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

use crate::config::{RuleTables, SourceConfig};
use crate::links::LinkNormalizer;
use crate::plausibility::PlausibilityClassifier;
use crate::title::{clean_text, resolve_title};
use crate::types::{Article, Candidate};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector"));
static HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4").expect("heading selector"));

/// Anchor texts shorter than this are icons or bullets.
const MIN_TEXT_TITLE_CHARS: usize = 4;

/// Source settings with selectors compiled once.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub name: String,
    pub search_url: String,
    pub preferred_domain: Option<String>,
    pub accept_language: Option<String>,
    pub limit: usize,
    pub fallback_limit: usize,
    blocks: Vec<Selector>,
    anchors: Vec<Selector>,
    titles: Vec<Selector>,
}

impl SourceProfile {
    /// Invalid selectors are dropped with a warning.
    pub fn compile(cfg: &SourceConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            search_url: cfg.search_url.clone(),
            preferred_domain: cfg.preferred_domain.clone(),
            accept_language: cfg.accept_language.clone(),
            limit: cfg.limit,
            fallback_limit: cfg.fallback_limit,
            blocks: compile_selectors(&cfg.name, &cfg.blocks),
            anchors: compile_selectors(&cfg.name, &cfg.anchors),
            titles: compile_selectors(&cfg.name, &cfg.title_selectors),
        }
    }

    pub fn search_url_for(&self, term: &str) -> String {
        let q = urlencoding::encode(term.trim()).replace("%20", "+");
        self.search_url.replace("{query}", &q)
    }

    pub fn selector_count(&self) -> usize {
        self.blocks.len() + self.anchors.len()
    }
}

fn compile_selectors(source: &str, raw: &[String]) -> Vec<Selector> {
    raw.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                warn!(source, selector = %s, error = ?e, "dropping invalid selector");
                None
            }
        })
        .collect()
}

/// Link normalizer + plausibility classifier built from the same rule tables.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub normalizer: LinkNormalizer,
    pub classifier: PlausibilityClassifier,
}

impl CandidateFilter {
    pub fn new(rules: &RuleTables) -> Self {
        Self {
            normalizer: LinkNormalizer::new(rules),
            classifier: PlausibilityClassifier::new(rules),
        }
    }

    /// Normalize `href`; when that fails, retry once after resolving it
    /// against the preferred domain (catches path-relative hrefs).
    pub fn canonicalize(&self, href: &str, preferred: Option<&str>) -> Option<String> {
        if let Some(link) = self.normalizer.normalize(href, preferred) {
            return Some(link);
        }
        let base = Url::parse(preferred?).ok()?;
        let joined = base.join(href.trim()).ok()?;
        self.normalizer.normalize(joined.as_str(), preferred)
    }

    /// Canonicalize and vet one candidate.
    pub fn admit(&self, c: &Candidate, profile: &SourceProfile) -> Option<Article> {
        let link = self.canonicalize(&c.raw_link, profile.preferred_domain.as_deref())?;
        let title = resolve_title(&c.title, &link);
        let title = self.classifier.vet(&title, &link)?;
        let raw = c.raw_link.trim();
        Some(Article {
            title,
            source_link: (raw != link).then(|| raw.to_string()),
            link,
            source: profile.name.clone(),
        })
    }
}

/// Parse `html` and return up to `limit` admitted articles in page order.
pub fn harvest(
    html: &str,
    profile: &SourceProfile,
    filter: &CandidateFilter,
    limit: usize,
) -> Vec<Article> {
    let candidates = collect_candidates(html, profile);
    counter!("extract_candidates_total", "source" => profile.name.clone())
        .increment(candidates.len() as u64);

    let mut seen_links = HashSet::new();
    let mut out = Vec::new();
    let mut rejected = 0u64;
    for c in &candidates {
        if out.len() >= limit {
            break;
        }
        match filter.admit(c, profile) {
            Some(article) => {
                if seen_links.insert(article.link.clone()) {
                    out.push(article);
                }
            }
            None => rejected += 1,
        }
    }

    counter!("extract_rejected_total", "source" => profile.name.clone()).increment(rejected);
    debug!(
        source = %profile.name,
        candidates = candidates.len(),
        admitted = out.len(),
        rejected,
        "harvested page"
    );
    out
}

/// Selector cascade over the parsed page, deduplicated by raw href.
pub fn collect_candidates(html: &str, profile: &SourceProfile) -> Vec<Candidate> {
    let doc = Html::parse_document(html);

    let mut hits: Vec<(ElementRef<'_>, Option<ElementRef<'_>>)> = Vec::new();
    for sel in &profile.blocks {
        let blocks: Vec<ElementRef<'_>> = doc.select(sel).collect();
        if blocks.is_empty() {
            continue;
        }
        for block in blocks {
            let anchor = if block.value().name() == "a" {
                Some(block)
            } else {
                block.select(&ANCHOR).next()
            };
            if let Some(a) = anchor {
                hits.push((a, Some(block)));
            }
        }
        break;
    }
    if hits.is_empty() {
        for sel in &profile.anchors {
            hits.extend(doc.select(sel).map(|a| (a, None)));
        }
    }

    let mut seen_hrefs = HashSet::new();
    let mut out = Vec::new();
    for (a, block) in hits {
        let href = a
            .value()
            .attr("href")
            .or_else(|| a.value().attr("data-href"))
            .map(str::trim)
            .unwrap_or_default();
        if href.is_empty() || !seen_hrefs.insert(href.to_string()) {
            continue;
        }
        out.push(Candidate {
            title: title_text(a, block, profile),
            raw_link: href.to_string(),
        });
    }
    out
}

/// Title element text → anchor text → `title` attribute → nearby heading.
/// Empty when none yields usable text; the resolver then derives one.
fn title_text(a: ElementRef<'_>, block: Option<ElementRef<'_>>, profile: &SourceProfile) -> String {
    for sel in &profile.titles {
        let found = a
            .select(sel)
            .next()
            .or_else(|| block.and_then(|b| b.select(sel).next()));
        if let Some(el) = found {
            let t = element_text(el);
            if usable(&t) {
                return t;
            }
        }
    }

    let t = element_text(a);
    if usable(&t) {
        return t;
    }

    if let Some(t) = a.value().attr("title").map(clean_text) {
        if usable(&t) {
            return t;
        }
    }

    let heading = a
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|p| p.select(&HEADINGS).next())
        .map(element_text);
    match heading {
        Some(t) if usable(&t) => t,
        _ => String::new(),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn usable(t: &str) -> bool {
    t.chars().count() >= MIN_TEXT_TITLE_CHARS
}
