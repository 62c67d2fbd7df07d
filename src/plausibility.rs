// src/plausibility.rs
//! "Is this (title, link) pair probably a real article?"
//!
//! Deterministic and total: unparsable input is a rejection, never a panic.

use once_cell::sync::Lazy;
use url::Url;

use crate::config::RuleTables;
use crate::title::title_from_url;

pub const MIN_TITLE_CHARS: usize = 6;
pub const MIN_ALPHA_WORDS: usize = 2;
/// Trailing segments shorter than this are section roots, not stories.
const MIN_ARTICLE_SEGMENT_CHARS: usize = 3;

static DEFAULT_CLASSIFIER: Lazy<PlausibilityClassifier> =
    Lazy::new(|| PlausibilityClassifier::new(&RuleTables::default()));

/// Classify with the built-in rule tables.
pub fn is_article(title: &str, link: &str) -> bool {
    DEFAULT_CLASSIFIER.is_article(title, link)
}

#[derive(Debug, Clone)]
pub struct PlausibilityClassifier {
    denied_hosts: Vec<String>,
    noise_markers: Vec<String>,
    article_path_markers: Vec<String>,
    article_hosts: Vec<String>,
}

impl PlausibilityClassifier {
    pub fn new(rules: &RuleTables) -> Self {
        let lower = |v: &[String]| -> Vec<String> {
            v.iter()
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            denied_hosts: lower(&rules.denied_hosts),
            noise_markers: lower(&rules.noise_markers),
            article_path_markers: lower(&rules.article_path_markers),
            article_hosts: lower(&rules.article_hosts),
        }
    }

    pub fn is_article(&self, title: &str, link: &str) -> bool {
        self.vet(title, link).is_some()
    }

    /// Accept or reject the pair. On acceptance returns the title to display:
    /// the given one, or one re-derived from the link when the given title is
    /// a raw URL or carries undecoded query residue (`=`, `%`).
    ///
    /// Any returned title has at least six characters and two words that
    /// contain a letter.
    pub fn vet(&self, title: &str, link: &str) -> Option<String> {
        if !self.link_is_plausible(link) {
            return None;
        }

        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let title = if looks_like_url_residue(title) {
            let derived = title_from_url(link);
            if derived.chars().count() < 3 {
                return None;
            }
            derived
        } else {
            title.to_string()
        };

        title_is_plausible(&title).then_some(title)
    }

    fn link_is_plausible(&self, link: &str) -> bool {
        let Ok(url) = Url::parse(link.trim()) else {
            return false;
        };
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        if url.scheme().is_empty() || host.is_empty() {
            return false;
        }

        if self.denied_hosts.iter().any(|d| host_matches(&host, d)) {
            return false;
        }

        let lowered = link.to_ascii_lowercase();
        let known_article_shape = self
            .article_path_markers
            .iter()
            .any(|m| lowered.contains(m.as_str()))
            || self.article_hosts.iter().any(|h| host_matches(&host, h));
        if known_article_shape {
            let trailing = url
                .path()
                .split('/')
                .filter(|s| !s.is_empty())
                .last()
                .unwrap_or_default();
            if trailing.chars().count() < MIN_ARTICLE_SEGMENT_CHARS {
                return false;
            }
        }

        !self.noise_markers.iter().any(|m| lowered.contains(m.as_str()))
    }
}

impl Default for PlausibilityClassifier {
    fn default() -> Self {
        Self::new(&RuleTables::default())
    }
}

fn looks_like_url_residue(title: &str) -> bool {
    title.starts_with("http") || title.contains('=') || title.contains('%')
}

fn title_is_plausible(title: &str) -> bool {
    // A single dotted token is a filename or a domain.
    if title.contains('.') && !title.contains(char::is_whitespace) {
        return false;
    }
    if title.chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    alpha_word_count(title) >= MIN_ALPHA_WORDS
}

/// Words that carry text: tokens with at least one alphanumeric character.
/// Numbers count ("Eleicoes 2026" has two words) but a title made only of
/// numbers has none.
pub fn alpha_word_count(title: &str) -> usize {
    if !title.chars().any(char::is_alphabetic) {
        return 0;
    }
    title
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// `host` equals `pattern` or is a subdomain of it. `t.co` must not match
/// `microsoft.com`.
fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_headline() {
        assert!(is_article(
            "Câmara aprova reforma tributária",
            "https://g1.globo.com/politica/noticia/2026/05/02/camara-aprova.ghtml"
        ));
    }

    #[test]
    fn rejects_denied_hosts_and_subdomains() {
        assert!(!is_article("Veja o vídeo completo", "https://www.youtube.com/watch"));
        assert!(!is_article("Compartilhe esta matéria", "https://m.facebook.com/share/x"));
        assert!(!is_article("Link encurtado aqui", "https://bit.ly/abcdef"));
        // suffix match only on label boundary
        assert!(is_article(
            "Microsoft anuncia novo produto",
            "https://news.microsoft.com/2026/novo-produto"
        ));
    }

    #[test]
    fn rejects_noise_endpoints() {
        assert!(!is_article("Resultados da pesquisa", "https://site.com/search/all"));
        assert!(!is_article("Clique para ver mais", "https://site.com/click/abc"));
        assert!(!is_article("Página de busca geral", "https://site.com/busca/tudo"));
    }

    #[test]
    fn rejects_short_trailing_segment_on_article_hosts() {
        assert!(!is_article("Editoria de política", "https://g1.globo.com/sp"));
        assert!(!is_article("Página inicial do portal", "https://g1.globo.com/"));
    }

    #[test]
    fn rejects_weak_titles() {
        let link = "https://www.estadao.com.br/economia/juros-sobem-de-novo";
        assert!(!is_article("", link));
        assert!(!is_article("Juros", link));
        assert!(!is_article("estadao.com.br", link));
        assert!(!is_article("2026 2027 2028", link));
        assert!(!is_article("Ok", link));
    }

    #[test]
    fn slug_derived_title_with_year_is_accepted() {
        let link = "https://g1.globo.com/politica/eleicoes-2026";
        let title = crate::title::resolve_title("", link);
        assert_eq!(title, "Eleicoes 2026");
        assert!(is_article(&title, link));
        assert!(!is_article("Juros - -", "https://valor.globo.com/financas/juros"));
    }

    #[test]
    fn rederives_url_like_titles() {
        let link = "https://www.estadao.com.br/economia/juros-sobem-de-novo";
        let c = PlausibilityClassifier::default();
        assert_eq!(
            c.vet("https://www.estadao.com.br/economia/juros-sobem-de-novo", link)
                .as_deref(),
            Some("Juros Sobem De Novo")
        );
        assert_eq!(c.vet("q=juros&x=1", link).as_deref(), Some("Juros Sobem De Novo"));
    }

    #[test]
    fn rederived_host_title_is_rejected() {
        // slug too short: derivation falls back to the bare host, a dotted token
        assert!(!is_article("a=b", "https://www.estadao.com.br/x1"));
    }

    #[test]
    fn garbage_links_are_rejected() {
        assert!(!is_article("Título razoável aqui", "not a link"));
        assert!(!is_article("Título razoável aqui", "mailto:a@b.c"));
    }

    #[test]
    fn accepted_titles_meet_minimums() {
        let c = PlausibilityClassifier::default();
        let samples = [
            ("Dólar fecha em queda", "https://valor.globo.com/financas/dolar-fecha"),
            ("a b", "https://valor.globo.com/financas/dolar-fecha"),
            ("%E2%80%9C", "https://valor.globo.com/financas/dolar-fecha"),
            ("x=", "https://valor.globo.com/financas/ab"),
        ];
        for (t, l) in samples {
            if let Some(title) = c.vet(t, l) {
                assert!(title.chars().count() >= MIN_TITLE_CHARS, "{title}");
                assert!(alpha_word_count(&title) >= MIN_ALPHA_WORDS, "{title}");
            }
        }
    }
}
