//! HTTP surface consumed by the rendering layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::history::{self, HistoryRange};
use crate::i18n;
use crate::market::{AnalysisResult, HistoricalPoint, Language, MarketSnapshot};
use crate::scheduler::{Scheduler, TickerHandle};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    /// Keeps the tick task alive exactly as long as the router.
    ticker: Option<Arc<TickerHandle>>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            ticker: None,
        }
    }

    pub fn with_ticker(mut self, ticker: TickerHandle) -> Self {
        self.ticker = Some(Arc::new(ticker));
        self
    }
}

pub fn create_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/refresh", post(refresh))
        .route("/api/language", post(set_language))
        .route("/api/interval", post(set_interval))
        .route("/api/history", get(history_series))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Router without a static directory; what tests and the probe use.
pub fn router(state: AppState) -> Router {
    create_router(state, None)
}

#[derive(Debug, Serialize)]
struct StateOut {
    is_loading: bool,
    next_update_at: DateTime<Utc>,
    seconds_until_next_update: i64,
    last_error: Option<String>,
    /// Label for the retry control; present only alongside `last_error`.
    retry_label: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct DashboardOut {
    language: Language,
    interval_ms: u64,
    state: StateOut,
    snapshot: Option<MarketSnapshot>,
    analysis: Option<AnalysisResult>,
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardOut> {
    let view = state.scheduler.snapshot();
    let now = state.scheduler.now();
    let remaining = (view.state.next_update_at - now).num_seconds().max(0);
    let retry_label = view
        .state
        .last_error
        .as_ref()
        .map(|_| i18n::messages(view.language).retry);

    let (snapshot, analysis) = match view.report.as_deref() {
        Some(r) => {
            let mut analysis = r.analysis.clone();
            analysis.sources = r.analysis.display_sources().to_vec();
            (Some(r.snapshot.clone()), Some(analysis))
        }
        None => (None, None),
    };

    Json(DashboardOut {
        language: view.language,
        interval_ms: view.interval.as_millis() as u64,
        state: StateOut {
            is_loading: view.state.is_loading,
            next_update_at: view.state.next_update_at,
            seconds_until_next_update: remaining,
            last_error: view.state.last_error,
            retry_label,
        },
        snapshot,
        analysis,
    })
}

#[derive(Debug, Serialize)]
struct RefreshOut {
    started: bool,
}

async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<RefreshOut>) {
    let started = state.scheduler.request_refresh().is_some();
    info!(target: "api", started, "manual refresh requested");
    (StatusCode::ACCEPTED, Json(RefreshOut { started }))
}

#[derive(Debug, Deserialize)]
struct LanguageReq {
    language: String,
}

#[derive(Debug, Serialize)]
struct LanguageOut {
    language: Language,
    started: bool,
}

async fn set_language(
    State(state): State<AppState>,
    Json(body): Json<LanguageReq>,
) -> Result<(StatusCode, Json<LanguageOut>), (StatusCode, String)> {
    let language = Language::parse(&body.language).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("unsupported language '{}'", body.language),
        )
    })?;
    let started = state.scheduler.set_language(language).is_some();
    Ok((StatusCode::ACCEPTED, Json(LanguageOut { language, started })))
}

#[derive(Debug, Deserialize)]
struct IntervalReq {
    interval_ms: u64,
}

#[derive(Debug, Serialize)]
struct IntervalOut {
    interval_ms: u64,
}

async fn set_interval(
    State(state): State<AppState>,
    Json(body): Json<IntervalReq>,
) -> Json<IntervalOut> {
    let applied = state
        .scheduler
        .set_interval(Duration::from_millis(body.interval_ms));
    Json(IntervalOut {
        interval_ms: applied.as_millis() as u64,
    })
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    range: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryOut {
    range: HistoryRange,
    history: Vec<HistoricalPoint>,
}

async fn history_series(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<HistoryOut> {
    let range = q
        .range
        .as_deref()
        .and_then(HistoryRange::parse)
        .unwrap_or_default();
    let language = state.scheduler.snapshot().language;
    let points =
        history::load_history(state.scheduler.client().as_ref(), range, language).await;
    Json(HistoryOut {
        range,
        history: points,
    })
}
