/// Common error types
#[derive(thiserror::Error, Debug)]
pub enum SwatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing browser binary, missing credential, malformed input URL.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Neither story index location produced a usable payload.
    #[error("Story index error: {0}")]
    Index(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("LLM API error: {0}")]
    Llm(String),

    /// The model answered, but not with something we can use.
    #[error("Model response error: {0}")]
    ModelResponse(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl SwatchError {
    /// Configuration problems are never worth retrying.
    pub fn is_config(&self) -> bool {
        matches!(self, SwatchError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, SwatchError>;
