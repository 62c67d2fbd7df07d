//! News Pulse: binary entrypoint
//! Boots the Axum HTTP server, wiring configuration, the aggregation
//! pipeline, metrics and routes.

use std::sync::Arc;

use news_pulse::api::{create_router, AppState};
use news_pulse::config::AppConfig;
use news_pulse::metrics::Metrics;
use news_pulse::pipeline::Aggregator;
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_pulse=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let cfg = AppConfig::load_default()?;
    let aggregator = Aggregator::from_config(&cfg)?;
    info!(sources = ?aggregator.source_names(), "aggregator ready");

    let state = AppState {
        aggregator: Arc::new(aggregator),
    };
    let mut router = create_router(state);
    if let Some(m) = &metrics {
        router = router.merge(m.router());
    }

    Ok(router.into())
}
