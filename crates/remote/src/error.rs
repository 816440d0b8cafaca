use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("API error: {0}")]
    Api(String),
}

impl ApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ApiError::Auth(_) => "Authentication failed. Please sign in again.",
            ApiError::Network(_) => "Network error. Check your connection.",
            ApiError::GraphQl(_) => "The server rejected the request.",
            ApiError::Decode(_) => "The server sent an unexpected response.",
            ApiError::Io(_) => "Could not read or write a local file.",
            ApiError::Session(_) => "Could not access the stored session.",
            ApiError::Api(_) => "Server error. Please try again later.",
        }
    }

    /// Message reported by the server itself, when there is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Auth(msg) | ApiError::GraphQl(msg) | ApiError::Api(msg) => {
                Some(msg.as_str())
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn secret_patterns() -> &'static Regex {
    static PATTERNS: OnceLock<Regex> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Regex::new(r"(Bearer\s+)[^\s]+|eyJ[\w-]+\.[\w-]+\.[\w-]+")
            .expect("secret redaction pattern is valid")
    })
}

/// Masks bearer credentials and JWT-shaped tokens before text reaches logs or the operator.
pub fn redact_secrets(input: &str) -> String {
    secret_patterns()
        .replace_all(input, |caps: &regex::Captures<'_>| match caps.get(1) {
            Some(prefix) => format!("{}[REDACTED]", prefix.as_str()),
            None => "[REDACTED]".to_string(),
        })
        .into_owned()
}
