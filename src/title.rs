// src/title.rs
//! Title resolution and anchor-text cleanup. Pure functions, no I/O.

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

/// Longest title we keep; longer anchor text is usually a teaser paragraph.
const MAX_TITLE_CHARS: usize = 300;

/// Prefer non-empty anchor text, otherwise derive a title from the link.
pub fn resolve_title(anchor_text: &str, link: &str) -> String {
    let cleaned = clean_text(anchor_text);
    if !cleaned.is_empty() {
        return cleaned;
    }
    title_from_url(link)
}

/// Human-readable title from the last path segment of `link`.
///
/// `.../politica/eleicoes-2026` → `Eleicoes 2026`. Falls back to the host when
/// the segment is too short or purely numeric, and to the raw link when it does
/// not parse at all.
pub fn title_from_url(link: &str) -> String {
    let Ok(url) = Url::parse(link.trim()) else {
        return link.trim().to_string();
    };
    let host = url.host_str().unwrap_or_default().to_string();

    let Some(last) = url.path().split('/').filter(|s| !s.is_empty()).last() else {
        return host;
    };

    let decoded = urlencoding::decode(last)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| last.to_string());
    let stem = strip_extension(&decoded);
    let spaced = stem.replace(['-', '_'], " ");
    let words: Vec<&str> = spaced.split_whitespace().collect();
    let joined = words.join(" ");

    let compact: String = joined.chars().filter(|c| !c.is_whitespace()).collect();
    if joined.chars().count() < 3 || compact.chars().all(|c| c.is_ascii_digit()) {
        return host;
    }

    words
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse markup residue in anchor text: decode entities, drop stray tags,
/// unify curly quotes, squeeze whitespace, cap length.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string();
    }
    out
}

/// Drop a trailing `.ext` (1..=5 alphanumerics) from a path segment.
fn strip_extension(seg: &str) -> &str {
    match seg.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => seg,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
