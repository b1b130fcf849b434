//! AI collaborator: provider abstraction + Gemini, mock and disabled clients.

pub mod gemini;
pub mod mock;
pub mod prompt;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::config::AiConfig;
use crate::error::FetchResult;
use crate::extract;
use crate::history::HistoryRange;
use crate::market::{Citation, HistoricalPoint, Language, MarketReport};

pub use gemini::GeminiClient;
pub use mock::{DisabledClient, MockClient};

/// Free text plus the grounding citations returned alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Ask for live prices, news and a prediction written in `language`.
    async fn fetch_market_text(&self, language: Language) -> FetchResult<GeneratedText>;

    /// Structured price history for the chart view.
    async fn fetch_history(
        &self,
        range: HistoryRange,
        language: Language,
    ) -> FetchResult<Vec<HistoricalPoint>>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynMarketClient = Arc<dyn MarketDataClient>;

/// Fetch and extract in one step; this is what a scheduled refresh runs.
pub async fn fetch_market_report(
    client: &dyn MarketDataClient,
    language: Language,
    now: impl FnOnce() -> DateTime<FixedOffset>,
) -> FetchResult<MarketReport> {
    let generated = client.fetch_market_text(language).await?;
    let report = extract::extract(&generated.text, &generated.citations, language, now());
    info!(
        target: "ai",
        provider = client.provider_name(),
        text_len = generated.text.len(),
        sources = report.analysis.sources.len(),
        news = report.analysis.news.len(),
        prediction = ?report.analysis.prediction,
        "market text extracted"
    );
    Ok(report)
}

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock` (or provider "mock"), returns a deterministic mock client.
/// * Else if no API key is available, returns the disabled client.
/// * Else builds the Gemini client.
pub fn build_client(config: &AiConfig) -> anyhow::Result<DynMarketClient> {
    let test_mode = std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false);
    if test_mode || config.provider == "mock" {
        return Ok(Arc::new(MockClient::default()));
    }

    if !config.has_credential() {
        warn!(target: "ai", "no AI API key configured; fetches will report a configuration error");
        return Ok(Arc::new(DisabledClient));
    }

    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        other => anyhow::bail!("Unsupported AI provider in config: {other}"),
    }
}
