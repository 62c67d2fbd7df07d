// src/extract/render.rs
//! Headless Chrome page rendering (cargo feature `render`).

use std::sync::Arc;

use super::fetch::PageFetcher;
use crate::config::RenderConfig;

/// The renderer for the fallback strategy, if this build has one and
/// configuration allows it.
pub fn default_renderer(cfg: &RenderConfig) -> Option<Arc<dyn PageFetcher>> {
    if !cfg.enabled {
        return None;
    }
    build(cfg)
}

#[cfg(feature = "render")]
fn build(cfg: &RenderConfig) -> Option<Arc<dyn PageFetcher>> {
    Some(Arc::new(chrome::ChromeRenderer::new(
        std::time::Duration::from_millis(cfg.settle_ms),
    )))
}

#[cfg(not(feature = "render"))]
fn build(_cfg: &RenderConfig) -> Option<Arc<dyn PageFetcher>> {
    tracing::debug!("built without `render`; rendered fallback disabled");
    None
}

#[cfg(feature = "render")]
pub mod chrome {
    use anyhow::{anyhow, Context, Result};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use futures::StreamExt;
    use std::time::Duration;

    use crate::extract::fetch::PageFetcher;

    /// One headless browser per rendered page; nothing outlives the call.
    pub struct ChromeRenderer {
        settle: Duration,
    }

    impl ChromeRenderer {
        pub fn new(settle: Duration) -> Self {
            Self { settle }
        }
    }

    #[async_trait]
    impl PageFetcher for ChromeRenderer {
        async fn fetch(&self, url: &str, _accept_language: Option<&str>) -> Result<String> {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(|e| anyhow!("browser config: {e}"))?;
            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .context("launching headless chrome")?;
            let pump = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let rendered = async {
                let page = browser.new_page(url).await.context("opening page")?;
                tokio::time::sleep(self.settle).await;
                page.content().await.context("reading rendered markup")
            }
            .await;

            if let Err(e) = browser.close().await {
                tracing::debug!(error = %e, "closing headless chrome");
            }
            let _ = pump.await;
            rendered
        }

        fn name(&self) -> &'static str {
            "chrome"
        }
    }
}
