// src/sentiment/polarity.rs
use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, f32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f32>>(raw).expect("valid sentiment lexicon")
});

/// Scale applied to a word preceded by a negator ("not good" is mildly bad).
const NEGATION_FACTOR: f32 = -0.5;
const INTENSIFIER_FACTOR: f32 = 1.3;
/// How many preceding tokens a negator reaches.
const NEGATION_REACH: usize = 3;

/// Lexicon-based polarity scorer.
#[derive(Debug, Clone, Default)]
pub struct PolarityAnalyzer;

impl PolarityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_polarity(&self, w: &str) -> Option<f32> {
        LEXICON.get(w).copied()
    }

    /// Mean polarity of the lexicon words in `text`, in [-1, 1].
    /// Text without any lexicon word scores 0.0.
    pub fn polarity(&self, text: &str) -> f32 {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut sum = 0.0f32;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let Some(base) = self.word_polarity(tokens[i].as_str()) else {
                continue;
            };

            let negated =
                (1..=NEGATION_REACH).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            let intensified = i >= 1 && is_intensifier(tokens[i - 1].as_str());

            let mut p = base;
            if intensified {
                p *= INTENSIFIER_FACTOR;
            }
            if negated {
                p *= NEGATION_FACTOR;
            }
            sum += p.clamp(-1.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (sum / hits as f32).clamp(-1.0, 1.0)
    }
}

/// Lower-cased word tokens; apostrophes stay so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "don't"
            | "doesn't"
            | "didn't"
            | "não"
            | "nunca"
            | "sem"
    )
}

fn is_intensifier(tok: &str) -> bool {
    matches!(
        tok,
        "very" | "extremely" | "really" | "highly" | "so" | "too" | "muito" | "extremamente"
    )
}
