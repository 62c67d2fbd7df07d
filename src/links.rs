// src/links.rs
//! Link canonicalization: unwrap search-engine redirects, resolve relative
//! hrefs, reject tracking/search endpoints, strip query and fragment.
//!
//! Every failure is `None`; a bad link drops one candidate, never a run.

use once_cell::sync::Lazy;
use url::Url;

use crate::config::RuleTables;

/// Base used to parse origin-relative redirect wrappers like `/url?q=...`.
const REDIRECT_BASE: &str = "https://www.google.com";
const REDIRECT_MARKER: &str = "/url?q=";
/// Nested redirect wrappers deeper than this are treated as garbage.
const MAX_UNWRAP_DEPTH: u8 = 3;

static DEFAULT_NORMALIZER: Lazy<LinkNormalizer> =
    Lazy::new(|| LinkNormalizer::new(&RuleTables::default()));

/// Normalize with the built-in rule tables.
pub fn normalize(raw_link: &str, preferred_domain: Option<&str>) -> Option<String> {
    DEFAULT_NORMALIZER.normalize(raw_link, preferred_domain)
}

#[derive(Debug, Clone)]
pub struct LinkNormalizer {
    tracking_markers: Vec<String>,
    search_engine_hosts: Vec<String>,
}

impl LinkNormalizer {
    pub fn new(rules: &RuleTables) -> Self {
        Self {
            tracking_markers: lowered(&rules.tracking_markers),
            search_engine_hosts: lowered(&rules.search_engine_hosts),
        }
    }

    /// Canonical `scheme://host[:port]/path` for `raw_link`, or `None` when
    /// the link is empty, malformed, a tracking endpoint or a search page.
    pub fn normalize(&self, raw_link: &str, preferred_domain: Option<&str>) -> Option<String> {
        self.normalize_at(raw_link, preferred_domain, 0)
    }

    fn normalize_at(&self, raw: &str, preferred: Option<&str>, depth: u8) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || depth > MAX_UNWRAP_DEPTH {
            return None;
        }

        if raw.contains(REDIRECT_MARKER) {
            let real = unwrap_redirect(raw)?;
            return self.normalize_at(&real, preferred, depth + 1);
        }

        if self.is_tracking(raw) {
            return None;
        }

        let absolute = if let Some(rest) = raw.strip_prefix("//") {
            format!("https://{rest}")
        } else if raw.starts_with('/') {
            // Origin-relative links are meaningless without a domain.
            let domain = preferred?.trim().trim_end_matches('/');
            if domain.is_empty() {
                return None;
            }
            format!("{domain}{raw}")
        } else {
            raw.to_string()
        };

        let url = match Url::parse(&absolute) {
            Ok(u) => u,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                // `www.site.com/x` lacks only a scheme; `economia/x` is a
                // path relative to the preferred domain.
                let first = absolute.split('/').next().unwrap_or_default();
                let host_like = first.contains('.') && !first.starts_with('.');
                match preferred {
                    Some(domain) if !host_like => {
                        let base = Url::parse(&format!("{}/", domain.trim_end_matches('/'))).ok()?;
                        base.join(&absolute).ok()?
                    }
                    _ => Url::parse(&format!("https://{absolute}")).ok()?,
                }
            }
            Err(_) => return None,
        };

        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.to_ascii_lowercase();
        if host.is_empty() {
            return None;
        }

        if self.is_search_engine(&host) && !is_news_property(&host, url.path()) {
            if url.path().starts_with("/url") {
                let real = query_param(&url, "q")?;
                return self.normalize_at(&real, preferred, depth + 1);
            }
            return None;
        }

        let mut out = format!("{}://{}", url.scheme(), host);
        if let Some(port) = url.port() {
            out.push(':');
            out.push_str(&port.to_string());
        }
        out.push_str(url.path());

        // Dot-segment resolution can assemble a tracking path that the raw
        // string did not spell out.
        if self.is_tracking(&out) {
            return None;
        }
        Some(out)
    }

    fn is_tracking(&self, link: &str) -> bool {
        let l = link.to_ascii_lowercase();
        self.tracking_markers.iter().any(|m| l.contains(m.as_str()))
    }

    fn is_search_engine(&self, host: &str) -> bool {
        self.search_engine_hosts
            .iter()
            .any(|m| host.contains(m.as_str()))
    }
}

impl Default for LinkNormalizer {
    fn default() -> Self {
        Self::new(&RuleTables::default())
    }
}

/// Real destination of a search-engine redirect wrapper: the `q` query
/// parameter, or the text after `/url?q=` up to the next `&`.
pub fn unwrap_redirect(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok().or_else(|| {
        Url::parse(REDIRECT_BASE)
            .ok()
            .and_then(|base| base.join(link).ok())
    });
    if let Some(url) = parsed {
        if let Some(q) = query_param(&url, "q") {
            return Some(q);
        }
    }

    let (_, rest) = link.split_once(REDIRECT_MARKER)?;
    let real = rest.split('&').next().unwrap_or_default();
    let decoded = urlencoding::decode(real)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| real.to_string());
    (!decoded.trim().is_empty()).then_some(decoded)
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.into_owned())
}

fn is_news_property(host: &str, path: &str) -> bool {
    host.starts_with("news.") || path.contains("news")
}

fn lowered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
