use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSynthError {
    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl DocSynthError {
    /// Short machine-readable name of the error kind, reported to API
    /// clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Http(_) => "HttpError",
            Self::Json(_) => "JsonError",
            Self::Llm(_) => "LlmError",
            Self::Io(_) => "IoError",
            Self::Validation(_) => "ValidationError",
        }
    }
}

pub type Result<T> = std::result::Result<T, DocSynthError>;
