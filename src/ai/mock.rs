use crate::error::{FetchError, FetchResult};
use crate::history::HistoryRange;
use crate::market::{Citation, HistoricalPoint, Language};

use super::{GeneratedText, MarketDataClient};

const MOCK_TEXT_EN: &str = "Gold prices in Egypt held firm this week as the pound traded \
steadily against the dollar. Local demand for 21k jewelry remains strong ahead of the \
wedding season.

--- DATA START ---
Price24k: 4,560
Price21k: 3,990
Price18k: 3,420
USDRate: 48.60
WorkmanshipMin: 70
WorkmanshipMax: 160
News1: Gold steady as global prices consolidate | Mock Wire
News2: Central Bank keeps rates unchanged | Mock Wire
News3: Jewelry demand rises before holidays | Mock Daily
Prediction: UP
--- DATA END ---";

const MOCK_TEXT_AR: &str = "استقرت أسعار الذهب في مصر هذا الأسبوع مع تداول الجنيه بثبات أمام الدولار.

--- DATA START ---
Price24k: 4,560
Price21k: 3,990
Price18k: 3,420
USDRate: 48.60
WorkmanshipMin: 70
WorkmanshipMax: 160
News1: استقرار الذهب مع تماسك الأسعار العالمية | وكالة تجريبية
News2: البنك المركزي يثبت أسعار الفائدة | وكالة تجريبية
News3: ارتفاع الطلب على المشغولات قبل الأعياد | صحيفة تجريبية
Prediction: UP
--- DATA END ---";

/// Deterministic client for tests and `AI_TEST_MODE=mock` local runs.
#[derive(Debug, Clone, Default)]
pub struct MockClient;

#[async_trait::async_trait]
impl MarketDataClient for MockClient {
    async fn fetch_market_text(&self, language: Language) -> FetchResult<GeneratedText> {
        let text = match language {
            Language::En => MOCK_TEXT_EN,
            Language::Ar => MOCK_TEXT_AR,
        };
        Ok(GeneratedText {
            text: text.to_string(),
            citations: vec![
                Citation::new("Mock Wire", "https://mock.invalid/wire"),
                Citation::new("Mock Daily", "https://mock.invalid/daily"),
                Citation::new("Mock Wire", "https://mock.invalid/wire"),
            ],
        })
    }

    async fn fetch_history(
        &self,
        range: HistoryRange,
        _language: Language,
    ) -> FetchResult<Vec<HistoricalPoint>> {
        let points = range.days().min(7);
        Ok((0..points)
            .map(|i| HistoricalPoint {
                date: format!("2025-01-{:02}", i + 1),
                price21k: 3900.0 + 15.0 * i as f64,
                usd_rate: 48.5,
            })
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Returned when no credential is configured; never touches the network.
#[derive(Debug, Clone, Default)]
pub struct DisabledClient;

#[async_trait::async_trait]
impl MarketDataClient for DisabledClient {
    async fn fetch_market_text(&self, _language: Language) -> FetchResult<GeneratedText> {
        Err(FetchError::MissingCredential)
    }

    async fn fetch_history(
        &self,
        _range: HistoryRange,
        _language: Language,
    ) -> FetchResult<Vec<HistoricalPoint>> {
        Err(FetchError::MissingCredential)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}
