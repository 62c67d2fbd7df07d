// tests/links_normalize.rs
//
// Link canonicalization through the public API, plus a seeded randomized
// idempotence check over assembled hrefs.

use news_pulse::config::RuleTables;
use news_pulse::links::LinkNormalizer;
use news_pulse::normalize;
use rand::seq::IndexedRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[test]
fn google_redirect_yields_destination() {
    let raw = "https://www.google.com/url?q=https://g1.globo.com/noticia/abc&sa=U";
    assert_eq!(
        normalize(raw, None).as_deref(),
        Some("https://g1.globo.com/noticia/abc")
    );
}

#[test]
fn click_tracking_endpoint_is_null() {
    assert_eq!(normalize("https://site.com/busca/click?x=1", None), None);
    assert_eq!(
        normalize("/busca/click?q=x", Some("https://g1.globo.com")),
        None
    );
}

#[test]
fn relative_links_need_a_domain() {
    assert_eq!(
        normalize("/economia/noticia/x.ghtml", Some("https://g1.globo.com/")).as_deref(),
        Some("https://g1.globo.com/economia/noticia/x.ghtml")
    );
    assert_eq!(normalize("/economia/noticia/x.ghtml", None), None);
    assert_eq!(
        normalize("economia/x", Some("https://g1.globo.com")).as_deref(),
        Some("https://g1.globo.com/economia/x")
    );
}

#[test]
fn scheme_less_host_defaults_to_https() {
    assert_eq!(
        normalize("www.bbc.com/portuguese/articles/c123", None).as_deref(),
        Some("https://www.bbc.com/portuguese/articles/c123")
    );
    assert_eq!(
        normalize("//valor.globo.com/brasil/x", None).as_deref(),
        Some("https://valor.globo.com/brasil/x")
    );
}

#[test]
fn query_and_fragment_never_reach_the_output() {
    let a = normalize("https://g1.globo.com/a?utm_source=tw#top", None);
    let b = normalize("https://G1.globo.com/a?utm_source=fb", None);
    assert_eq!(a, b);
    assert_eq!(a.as_deref(), Some("https://g1.globo.com/a"));
}

#[test]
fn search_pages_and_garbage_are_null() {
    assert_eq!(normalize("https://www.google.com/search?q=x&tbm=nws", None), None);
    assert_eq!(normalize("", None), None);
    assert_eq!(normalize("   ", None), None);
    assert_eq!(normalize("javascript:void(0)", None), None);
    assert_eq!(normalize("mailto:redacao@g1.com", None), None);
    assert_eq!(normalize("http://", None), None);
}

#[test]
fn custom_rule_tables_are_honoured() {
    let rules = RuleTables {
        tracking_markers: vec!["/out/".into()],
        search_engine_hosts: vec!["bing.".into()],
        ..RuleTables::default()
    };
    let n = LinkNormalizer::new(&rules);
    assert_eq!(n.normalize("https://portal.com/out/123", None), None);
    assert_eq!(n.normalize("https://www.bing.com/search?q=a", None), None);
    // "busca/click" is no longer a marker under these rules
    assert_eq!(
        n.normalize("https://site.com/busca/click", None).as_deref(),
        Some("https://site.com/busca/click")
    );
}

#[test]
fn normalization_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(0x6e65_7773);
    let prefixes = [
        "https://",
        "http://",
        "//",
        "",
        "/",
        "https://www.google.com/url?q=https://",
        "/url?q=https%3A%2F%2F",
    ];
    let hosts = [
        "g1.globo.com",
        "www.bbc.com",
        "valor.globo.com:8443",
        "news.google.com",
        "www.google.com",
        "site.com",
        "Folha.UOL.com.br",
    ];
    let segments = [
        "noticia", "economia", "2026", "busca", "click", "..", ".", "a%20b", "x.ghtml", "news",
        "ação", "",
    ];
    let tails = ["", "?utm=1", "#frag", "?q=1&sa=U", "/"];
    let domains = [None, Some("https://g1.globo.com"), Some("https://www.bbc.com/")];

    let mut checked = 0;
    for _ in 0..2_000 {
        let mut raw = String::new();
        raw.push_str(prefixes.choose(&mut rng).copied().unwrap_or_default());
        raw.push_str(hosts.choose(&mut rng).copied().unwrap_or_default());
        for _ in 0..rng.random_range(0..4) {
            raw.push('/');
            raw.push_str(segments.choose(&mut rng).copied().unwrap_or_default());
        }
        raw.push_str(tails.choose(&mut rng).copied().unwrap_or_default());
        let preferred = domains.choose(&mut rng).copied().flatten();

        if let Some(once) = normalize(&raw, preferred) {
            let twice = normalize(&once, preferred);
            assert_eq!(twice.as_deref(), Some(once.as_str()), "raw={raw:?}");
            // without the domain too: the output is absolute
            assert_eq!(normalize(&once, None).as_deref(), Some(once.as_str()));
            checked += 1;
        }
    }
    assert!(checked > 100, "generator produced too few valid links: {checked}");
}
