//! history.rs — secondary fetch path for the historical chart.
//!
//! Failures here never surface as errors: the chart simply shows no data.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::MarketDataClient;
use crate::market::{HistoricalPoint, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HistoryRange {
    #[serde(rename = "1W")]
    Week,
    #[default]
    #[serde(rename = "1M")]
    Month,
    #[serde(rename = "3M")]
    Quarter,
}

impl HistoryRange {
    pub fn days(self) -> usize {
        match self {
            HistoryRange::Week => 7,
            HistoryRange::Month => 30,
            HistoryRange::Quarter => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HistoryRange::Week => "1W",
            HistoryRange::Month => "1M",
            HistoryRange::Quarter => "3M",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1W" => Some(HistoryRange::Week),
            "1M" => Some(HistoryRange::Month),
            "3M" => Some(HistoryRange::Quarter),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct HistoryPayload {
    #[serde(default)]
    history: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoint {
    date: String,
    price21k: f64,
    usd_rate: f64,
}

/// Parse `{"history": [{date, price21k, usdRate}, ...]}`. The JSON may be
/// wrapped in a ```json fence. Malformed entries are skipped; a malformed
/// document yields an empty list.
pub fn parse_history_payload(text: &str) -> Vec<HistoricalPoint> {
    let body = strip_code_fence(text);
    let payload: HistoryPayload = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            warn!(target: "ai", error = %e, "history payload is not valid JSON");
            return Vec::new();
        }
    };
    payload
        .history
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawPoint>(v).ok())
        .filter(|p| p.price21k.is_finite() && p.usd_rate.is_finite())
        .map(|p| HistoricalPoint {
            date: p.date,
            price21k: p.price21k,
            usd_rate: p.usd_rate,
        })
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    // Drop an info string such as `json` on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
    rest.trim_end().trim_end_matches("```").trim()
}

/// Fetch history for `range`; any client error degrades to an empty series.
pub async fn load_history(
    client: &dyn MarketDataClient,
    range: HistoryRange,
    language: Language,
) -> Vec<HistoricalPoint> {
    match client.fetch_history(range, language).await {
        Ok(points) => points,
        Err(e) => {
            warn!(target: "ai", error = %e, range = range.label(), "history fetch failed");
            Vec::new()
        }
    }
}
