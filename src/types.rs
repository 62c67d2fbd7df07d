// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unvalidated (title, link) pair pulled out of raw markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub raw_link: String,
}

/// An accepted article. Immutable once built by an extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Canonical scheme+host+path form; the dedup key.
    pub link: String,
    /// Original (possibly redirect-wrapped) href, when it differs from `link`.
    #[serde(default)]
    pub source_link: Option<String>,
    /// Name of the originating source, e.g. "G1".
    pub source: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article after merge, carrying its one sentiment label.
/// Only the pipeline builds these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StampedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub sentiment: Sentiment,
}
