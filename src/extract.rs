//! Market data extraction: turns the free-form AI answer into a `MarketReport`.
//!
//! The model is asked to end its answer with a block like
//!
//! ```text
//! --- DATA START ---
//! Price24k: 5,123.50
//! Price21k: 4480
//! ...
//! News1: Headline | Source
//! Prediction: UP
//! --- DATA END ---
//! ```
//!
//! Every field is matched independently and falls back to a default when it is
//! missing or malformed, so extraction itself never fails.

use chrono::{DateTime, FixedOffset, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::market::{
    AnalysisResult, Citation, Language, MarketReport, MarketSnapshot, NewsItem, Prediction,
    SourceCitation,
};

pub const DATA_START_MARKER: &str = "--- DATA START ---";

pub const DEFAULT_WORKMANSHIP_MIN: f64 = 60.0;
pub const DEFAULT_WORKMANSHIP_MAX: f64 = 150.0;

const MAX_NEWS: usize = 3;
const PLACEHOLDER_URL: &str = "#";
const FALLBACK_SOURCE_TITLE: &str = "Source";

fn amount_regex(label: &str) -> Regex {
    Regex::new(&format!(r"(?i){label}:\s*([\d,.]+)")).expect("valid amount regex")
}

static RE_PRICE_24K: Lazy<Regex> = Lazy::new(|| amount_regex("Price24k"));
static RE_PRICE_21K: Lazy<Regex> = Lazy::new(|| amount_regex("Price21k"));
static RE_PRICE_18K: Lazy<Regex> = Lazy::new(|| amount_regex("Price18k"));
static RE_USD_RATE: Lazy<Regex> = Lazy::new(|| amount_regex("USDRate"));
static RE_WORK_MIN: Lazy<Regex> = Lazy::new(|| amount_regex("WorkmanshipMin"));
static RE_WORK_MAX: Lazy<Regex> = Lazy::new(|| amount_regex("WorkmanshipMax"));

static RE_PREDICTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Prediction:\s*(UP|DOWN|STABLE)").expect("valid regex"));

// Headline stops at the first pipe; source runs to end of line.
static RE_NEWS: Lazy<[Regex; MAX_NEWS]> = Lazy::new(|| {
    [1, 2, 3].map(|n| {
        Regex::new(&format!(r"(?i)News{n}:\s*([^|\r\n]+)\|\s*(.+)")).expect("valid news regex")
    })
});

/// Full extraction pass. Pure apart from `now`, which stamps `last_updated`.
pub fn extract(
    raw_text: &str,
    citations: &[Citation],
    language: Language,
    now: DateTime<FixedOffset>,
) -> MarketReport {
    let mut workmanship_min = amount_or(&RE_WORK_MIN, raw_text, DEFAULT_WORKMANSHIP_MIN);
    let mut workmanship_max = amount_or(&RE_WORK_MAX, raw_text, DEFAULT_WORKMANSHIP_MAX);
    if workmanship_min > workmanship_max {
        std::mem::swap(&mut workmanship_min, &mut workmanship_max);
    }

    let snapshot = MarketSnapshot {
        price24k: amount_or(&RE_PRICE_24K, raw_text, 0.0),
        price21k: amount_or(&RE_PRICE_21K, raw_text, 0.0),
        price18k: amount_or(&RE_PRICE_18K, raw_text, 0.0),
        usd_rate: amount_or(&RE_USD_RATE, raw_text, 0.0),
        workmanship_min,
        workmanship_max,
        last_updated: format_clock(now, language),
    };

    let analysis = AnalysisResult {
        prediction: extract_prediction(raw_text),
        summary: analysis_text(raw_text).to_string(),
        reasoning: Vec::new(),
        sources: dedup_sources(citations),
        news: extract_news(raw_text),
    };

    MarketReport { snapshot, analysis }
}

fn amount_or(re: &Regex, text: &str, default: f64) -> f64 {
    capture(re, text).and_then(parse_amount).unwrap_or(default)
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Parse an amount such as `5,123.50`. Thousands separators are stripped,
/// sentence-final dots are ignored and Arabic-Indic digits are accepted.
/// Returns `None` for anything that is not a finite number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',')
        .map(from_arabic_indic)
        .collect();
    cleaned
        .trim()
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn extract_prediction(text: &str) -> Prediction {
    capture(&RE_PREDICTION, text)
        .map(Prediction::from_label)
        .unwrap_or_default()
}

/// Up to three news items in ascending `News<N>` order. Never padded.
pub fn extract_news(text: &str) -> Vec<NewsItem> {
    RE_NEWS
        .iter()
        .filter_map(|re| re.captures(text))
        .filter_map(|c| {
            let headline = c.get(1)?.as_str().trim();
            let source = c.get(2)?.as_str().trim();
            Some(NewsItem {
                headline: headline.to_string(),
                source: source.to_string(),
            })
        })
        .collect()
}

/// Everything before the data block, trimmed. Whole text when the marker is absent.
pub fn analysis_text(text: &str) -> &str {
    text.split(DATA_START_MARKER).next().unwrap_or("").trim()
}

/// Drops entries without a usable url and keeps the first occurrence of each url.
pub fn dedup_sources(citations: &[Citation]) -> Vec<SourceCitation> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(citations.len());
    for c in citations {
        let url = match c.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() && u != PLACEHOLDER_URL => u,
            _ => continue,
        };
        if !seen.insert(url) {
            continue;
        }
        let title = c
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_SOURCE_TITLE);
        out.push(SourceCitation {
            title: title.to_string(),
            url: url.to_string(),
        });
    }
    out
}

/// Wall-clock time as the dashboard shows it, e.g. `3:04:05 PM` or `٣:٠٤:٠٥ م`.
pub fn format_clock(now: DateTime<FixedOffset>, language: Language) -> String {
    match language {
        Language::En => now.format("%-I:%M:%S %p").to_string(),
        Language::Ar => {
            let (is_pm, _) = now.hour12();
            let marker = if is_pm { "م" } else { "ص" };
            let digits: String = now
                .format("%-I:%M:%S")
                .to_string()
                .chars()
                .map(to_arabic_indic)
                .collect();
            format!("{digits} {marker}")
        }
    }
}

fn from_arabic_indic(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from_u32(c as u32 - 0x0660 + '0' as u32).unwrap_or(c),
        _ => c,
    }
}

fn to_arabic_indic(c: char) -> char {
    match c.to_digit(10) {
        Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
        None => c,
    }
}
