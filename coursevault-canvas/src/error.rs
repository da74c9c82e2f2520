//! Error types for coursevault-canvas.

use thiserror::Error;

/// Errors raised while talking to the remote LMS.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Non-success HTTP status other than a rate limit.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// DNS, TLS, connection, or timeout failure.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Response body did not match the expected shape.
    #[error("unexpected response from {url}: {source}")]
    Decode { url: String, source: std::io::Error },

    /// The remote asked us to slow down. Retried by [`crate::with_backoff`].
    #[error("rate limit exceeded")]
    RateLimited,

    /// Still rate limited after every retry.
    #[error("rate limit exceeded after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    /// A configured link pattern is not a valid regex.
    #[error("invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    /// Refused to fetch from a host other than the allowed one.
    #[error("refusing to fetch '{url}': host not allowed")]
    UntrustedHost { url: String },
}

impl CanvasError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CanvasError::RateLimited)
    }
}
