// src/sentiment/translate.rs
//! Translation into English ahead of polarity scoring.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::TranslationConfig;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` (language auto-detected) into English.
    async fn to_english(&self, text: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Client for the public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    http: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(cfg: &TranslationConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(cfg.timeout_secs.clamp(1, 4)))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .context("building translation http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn to_english(&self, text: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", "en"),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .context("building translation url")?;

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("translation request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("translation endpoint returned {}", resp.status()));
        }
        let body: serde_json::Value = resp.json().await.context("translation body")?;
        parse_translation(&body)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Body shape: `[[["translated chunk","original chunk",...],...],...]`.
pub(crate) fn parse_translation(body: &serde_json::Value) -> Result<String> {
    let chunks = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("unexpected translation payload"))?;
    let out: String = chunks
        .iter()
        .filter_map(|c| c.get(0).and_then(|s| s.as_str()))
        .collect();
    if out.trim().is_empty() {
        return Err(anyhow!("empty translation"));
    }
    Ok(out)
}

/// Returns the input unchanged; used when translation is switched off.
pub struct Passthrough;

#[async_trait]
impl Translator for Passthrough {
    async fn to_english(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}
