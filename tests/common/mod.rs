// tests/common/mod.rs
// Test doubles shared by the scheduler/ticker/API integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use egypt_gold_dashboard::ai::{GeneratedText, MarketDataClient};
use egypt_gold_dashboard::error::{FetchError, FetchResult};
use egypt_gold_dashboard::history::HistoryRange;
use egypt_gold_dashboard::market::{Citation, HistoricalPoint, Language};
use egypt_gold_dashboard::scheduler::Clock;
use parking_lot::Mutex;
use tokio::sync::Notify;

pub const SAMPLE_TEXT: &str = "Gold is firm.\n--- DATA START ---\nPrice24k: 4,560\nPrice21k: 3,990\nPrediction: UP\n--- DATA END ---";

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()),
        })
    }

    pub fn advance_secs(&self, secs: i64) {
        *self.now.lock() += ChronoDuration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub enum Scripted {
    Text(&'static str),
    Fail,
    MissingKey,
    Panic,
}

/// Client that plays back scripted outcomes and counts calls. When `gate` is
/// set, each fetch waits for one `notify_one` before answering.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    pub calls: AtomicUsize,
    pub languages: Mutex<Vec<Language>>,
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Self::build(script, None)
    }

    pub fn gated(script: Vec<Scripted>, gate: Arc<Notify>) -> Arc<Self> {
        Self::build(script, Some(gate))
    }

    fn build(script: Vec<Scripted>, gate: Option<Arc<Notify>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
            gate,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketDataClient for ScriptedClient {
    async fn fetch_market_text(&self, language: Language) -> FetchResult<GeneratedText> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages.lock().push(language);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(GeneratedText {
                text: text.to_string(),
                citations: vec![Citation::new("Wire", "https://wire.example")],
            }),
            Some(Scripted::MissingKey) => Err(FetchError::MissingCredential),
            Some(Scripted::Panic) => panic!("scripted client failure"),
            Some(Scripted::Fail) | None => Err(FetchError::Api {
                status: 503,
                body: "unavailable".into(),
            }),
        }
    }

    async fn fetch_history(
        &self,
        _range: HistoryRange,
        _language: Language,
    ) -> FetchResult<Vec<HistoricalPoint>> {
        Err(FetchError::EmptyResponse)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
