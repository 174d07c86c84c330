use thiserror::Error;

/// Characters of a failed response body kept in [`LlmError::Api`]
pub const ERROR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error ({status}): {excerpt}")]
    Api { status: u16, excerpt: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Cancellation is a normal outcome, not a reportable failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Build an [`LlmError::Api`] from a non-success status and the full body text
    pub fn api(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            excerpt: truncate_excerpt(body, ERROR_EXCERPT_CHARS),
        }
    }
}

/// First `max_chars` characters of `text` (never splits a code point)
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
