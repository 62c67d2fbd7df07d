// src/sentiment/mod.rs
//! Headline sentiment: translate to English, score polarity, threshold.
//!
//! Advisory only. Every failure path ends in `Sentiment::Neutral`.

pub mod polarity;
pub mod translate;

use metrics::counter;
use std::sync::Arc;
use tracing::debug;

pub use crate::types::Sentiment;
pub use polarity::PolarityAnalyzer;
pub use translate::{GoogleTranslator, Passthrough, Translator};

use crate::config::TranslationConfig;

pub const POSITIVE_THRESHOLD: f32 = 0.1;
pub const NEGATIVE_THRESHOLD: f32 = -0.1;

#[derive(Clone)]
pub struct SentimentClassifier {
    translator: Arc<dyn Translator>,
    analyzer: PolarityAnalyzer,
}

impl SentimentClassifier {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            analyzer: PolarityAnalyzer::new(),
        }
    }

    /// Google translation when enabled (and the client builds), else passthrough.
    pub fn from_config(cfg: &TranslationConfig) -> Self {
        if cfg.enabled {
            match GoogleTranslator::new(cfg) {
                Ok(t) => return Self::new(Arc::new(t)),
                Err(e) => {
                    tracing::warn!(error = ?e, "translator unavailable; scoring untranslated text")
                }
            }
        }
        Self::new(Arc::new(Passthrough))
    }

    pub async fn classify(&self, text: &str) -> Sentiment {
        let text = text.trim();
        if text.is_empty() {
            return Sentiment::Neutral;
        }

        let english = match self.translator.to_english(text).await {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, translator = self.translator.name(), "translation failed");
                counter!("sentiment_translation_failures_total").increment(1);
                text.to_string()
            }
        };

        label_for(self.analyzer.polarity(&english))
    }
}

/// Threshold a polarity score into a label. Non-finite scores are neutral.
pub fn label_for(polarity: f32) -> Sentiment {
    if !polarity.is_finite() {
        return Sentiment::Neutral;
    }
    if polarity > POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if polarity < NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(label_for(0.1), Sentiment::Neutral);
        assert_eq!(label_for(0.11), Sentiment::Positive);
        assert_eq!(label_for(-0.1), Sentiment::Neutral);
        assert_eq!(label_for(-0.11), Sentiment::Negative);
        assert_eq!(label_for(f32::NAN), Sentiment::Neutral);
    }
}
