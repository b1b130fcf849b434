//! Gemini provider (`generateContent` REST API).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::{FetchError, FetchResult};
use crate::history::{self, HistoryRange};
use crate::market::{Citation, HistoricalPoint, Language};

use super::{prompt, GeneratedText, MarketDataClient};

/// Error bodies are cut to this many chars before logging/returning.
const MAX_ERROR_BODY: usize = 300;

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    search_grounding: bool,
}

impl GeminiClient {
    pub fn new(cfg: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("egypt-gold-dashboard/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            cfg.base_url.trim_end_matches('/'),
            cfg.model
        );
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            endpoint,
            search_grounding: cfg.search_grounding,
        })
    }

    async fn generate(&self, req: &GenerateRequest<'_>) -> FetchResult<GenerateResponse> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingCredential);
        }
        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            warn!(target: "ai", status = status.as_u16(), "gemini request failed");
            return Err(FetchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl MarketDataClient for GeminiClient {
    async fn fetch_market_text(&self, language: Language) -> FetchResult<GeneratedText> {
        let prompt = prompt::market_prompt(language);
        let tools = if self.search_grounding {
            vec![Tool {
                google_search: EmptyObject {},
            }]
        } else {
            Vec::new()
        };
        let req = GenerateRequest {
            contents: vec![Content::user(&prompt)],
            tools,
            generation_config: None,
        };
        let resp = self.generate(&req).await?;
        let generated = resp.into_generated();
        if generated.text.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        debug!(
            target: "ai",
            text_len = generated.text.len(),
            citations = generated.citations.len(),
            "gemini market text received"
        );
        Ok(generated)
    }

    async fn fetch_history(
        &self,
        range: HistoryRange,
        _language: Language,
    ) -> FetchResult<Vec<HistoricalPoint>> {
        let prompt = prompt::history_prompt(range);
        let req = GenerateRequest {
            contents: vec![Content::user(&prompt)],
            tools: Vec::new(),
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };
        let resp = self.generate(&req).await?;
        let text = resp.into_generated().text;
        if text.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        Ok(history::parse_history_payload(&text))
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Wire types
// ------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<RespContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}

#[derive(Debug, Default, Deserialize)]
struct RespPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate (all parts joined) and its grounding links.
    fn into_generated(self) -> GeneratedText {
        let Some(first) = self.candidates.into_iter().next() else {
            return GeneratedText::default();
        };
        let text = first
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let citations = first
            .grounding_metadata
            .map(|g| g.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.web)
            .map(|web| Citation {
                title: web.title,
                url: web.uri,
            })
            .collect();
        GeneratedText { text, citations }
    }
}
