use thiserror::Error;

/// Failures at the AI collaborator boundary. Extraction never produces one of
/// these; only configuration and transport can.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("AI API key is missing; set GEMINI_API_KEY (or API_KEY)")]
    MissingCredential,

    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("json error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("AI API returned no text")]
    EmptyResponse,
}

impl FetchError {
    /// Configuration errors stay failing until fixed externally.
    pub fn is_configuration(&self) -> bool {
        matches!(self, FetchError::MissingCredential)
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
