// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod i18n;
pub mod market;
pub mod metrics;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::extract::extract;
pub use crate::market::{
    AnalysisResult, Language, MarketReport, MarketSnapshot, NewsItem, Prediction, SourceCitation,
};
pub use crate::scheduler::{RefreshState, Scheduler, TickerHandle};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("egypt_gold_dashboard=info,warn"));

    // try_init: a second call (tests, probe) is a no-op.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

/// Everything `main` wires together, minus the runtime-specific entrypoint.
pub struct Service {
    pub router: axum::Router,
    pub scheduler: Scheduler,
}

/// Build config, client, scheduler, ticker and router. Issues the initial
/// refresh, like the dashboard does on first load.
pub fn build_service(cfg: &config::DashboardConfig) -> anyhow::Result<Service> {
    let client = ai::build_client(&cfg.ai)?;
    info!(
        provider = client.provider_name(),
        model = %cfg.ai.model,
        interval_secs = cfg.refresh.interval().as_secs(),
        language = cfg.ui.language.code(),
        "dashboard service starting"
    );

    let scheduler = Scheduler::new(client, cfg.ui.language, cfg.refresh.interval());
    let ticker = scheduler.spawn_ticker(cfg.refresh.tick());
    let _ = scheduler.request_refresh();

    let state = api::AppState::new(scheduler.clone()).with_ticker(ticker);
    let mut router = api::create_router(state, cfg.ui.static_dir.clone());

    match metrics::Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "prometheus recorder not installed; /metrics disabled"),
    }

    Ok(Service { router, scheduler })
}
