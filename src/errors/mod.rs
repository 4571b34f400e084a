use std::fmt;

use thiserror::Error;

/// Why the primary news source could not provide articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// Non-2xx response
    HttpStatus(u16),
    /// Plan or origin restriction (426, 403)
    Restricted(u16),
    /// Body reported `status != "ok"`
    Provider { code: Option<String>, message: String },
    MissingApiKey,
    /// Provider answered but nothing usable survived filtering
    Empty,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::HttpStatus(code) => write!(f, "HTTP status {}", code),
            UnavailableReason::Restricted(code) => write!(f, "access restricted (HTTP {})", code),
            UnavailableReason::Provider { code: Some(code), message } => {
                write!(f, "provider error {}: {}", code, message)
            }
            UnavailableReason::Provider { code: None, message } => {
                write!(f, "provider error: {}", message)
            }
            UnavailableReason::MissingApiKey => write!(f, "no API key configured"),
            UnavailableReason::Empty => write!(f, "no usable articles returned"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FlipError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Source errors
    #[error("News source unavailable: {0}")]
    SourceUnavailable(UnavailableReason),

    #[error("Article generation failed: {0}")]
    GenerationFailure(String),

    #[error("Article analysis failed: {0}")]
    AnalysisFailure(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),
}

pub type FlipResult<T> = Result<T, FlipError>;
