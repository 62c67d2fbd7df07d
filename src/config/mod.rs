// src/config/mod.rs
//! Process-wide configuration: pipeline defaults, fetch/render/translation
//! settings, filter rule tables and the ordered source list.
//!
//! Loaded once at startup and shared read-only (`Arc<AppConfig>`).

pub mod sources;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use tracing::info;

pub use sources::{RuleTables, SourceConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/sources.toml";
pub const ENV_CONFIG_PATH: &str = "NEWS_PULSE_CONFIG";
pub const ENV_SAVE_TO_DB: &str = "SAVE_TO_DB";
pub const ENV_STORE_PATH: &str = "NEWS_PULSE_STORE_PATH";

const EMBEDDED_CONFIG: &str = include_str!("../../config/sources.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub rules: RuleTables,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    #[serde(default = "default_max_per_page")]
    pub max_per_page: usize,
    /// Write stamped results to the store after each run.
    #[serde(default)]
    pub persist: bool,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_sentiment_concurrency")]
    pub sentiment_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_translate_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
}

fn default_per_page() -> usize {
    12
}
fn default_max_per_page() -> usize {
    100
}
fn default_store_path() -> PathBuf {
    PathBuf::from("data/articles.jsonl")
}
fn default_sentiment_concurrency() -> usize {
    8
}
fn default_http_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()
}
fn default_true() -> bool {
    true
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_render_timeout() -> u64 {
    25
}
fn default_translate_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}
fn default_translate_timeout() -> u64 {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            persist: false,
            store_path: default_store_path(),
            sentiment_concurrency: default_sentiment_concurrency(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_ms: default_settle_ms(),
            timeout_secs: default_render_timeout(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_translate_endpoint(),
            timeout_secs: default_translate_timeout(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document and sanitize out-of-range values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing sources config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// The copy of `config/sources.toml` compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_CONFIG).expect("embedded sources config is valid")
    }

    /// Resolution order:
    /// 1) $NEWS_PULSE_CONFIG (must exist)
    /// 2) config/sources.toml
    /// 3) embedded copy
    ///
    /// Env toggles are applied afterwards.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from_file(&pb)?
        } else {
            let local = PathBuf::from(DEFAULT_CONFIG_PATH);
            if local.exists() {
                Self::load_from_file(&local)?
            } else {
                Self::embedded()
            }
        };
        cfg.apply_env_overrides();
        info!(
            sources = cfg.sources.len(),
            persist = cfg.pipeline.persist,
            "configuration loaded"
        );
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if env::var(ENV_SAVE_TO_DB).ok().as_deref() == Some("1") {
            self.pipeline.persist = true;
        }
        if let Ok(p) = env::var(ENV_STORE_PATH) {
            if !p.trim().is_empty() {
                self.pipeline.store_path = PathBuf::from(p.trim());
            }
        }
    }

    fn sanitize(&mut self) {
        if self.pipeline.default_per_page == 0 {
            self.pipeline.default_per_page = default_per_page();
        }
        if self.pipeline.max_per_page < self.pipeline.default_per_page {
            self.pipeline.max_per_page = self.pipeline.default_per_page;
        }
        if self.pipeline.sentiment_concurrency == 0 {
            self.pipeline.sentiment_concurrency = 1;
        }
        for s in &mut self.sources {
            s.sanitize();
        }
        // Unnamed sources cannot be attributed or filtered.
        self.sources.retain(|s| !s.name.trim().is_empty());
    }
}
