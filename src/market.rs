//! market.rs — value types shared by the extractor, scheduler and API.

use serde::{Deserialize, Serialize};

/// Consumers show at most this many citation links.
pub const MAX_DISPLAY_SOURCES: usize = 5;

/// Display language of the generated analysis. The AI text is produced in this
/// language, so switching it requires a fresh fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Case-insensitive parse of `en` / `ar` (also accepts `english` / `arabic`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "ar" | "arabic" => Some(Language::Ar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Prediction {
    Up,
    Down,
    #[default]
    Stable,
}

impl Prediction {
    /// Unrecognized labels map to `Stable`, never to an error.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Prediction::Up,
            "DOWN" => Prediction::Down,
            _ => Prediction::Stable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub price24k: f64,
    pub price21k: f64,
    pub price18k: f64,
    pub usd_rate: f64,
    pub workmanship_min: f64,
    pub workmanship_max: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub url: String,
}

/// Raw grounding entry as delivered next to the generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub prediction: Prediction,
    pub summary: String,
    /// Always empty for now; part of the rendering contract.
    #[serde(default)]
    pub reasoning: Vec<String>,
    pub sources: Vec<SourceCitation>,
    pub news: Vec<NewsItem>,
}

impl AnalysisResult {
    pub fn display_sources(&self) -> &[SourceCitation] {
        let n = self.sources.len().min(MAX_DISPLAY_SOURCES);
        &self.sources[..n]
    }
}

/// Snapshot and analysis from one extraction pass. Always replaced as a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketReport {
    pub snapshot: MarketSnapshot,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    pub date: String,
    pub price21k: f64,
    pub usd_rate: f64,
}
