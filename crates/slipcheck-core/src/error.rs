//! Provider error types.
//!
//! These represent failures while escalating an answer to the AI judge.
//! Defined in `slipcheck-core` so the assessment engine can downcast them
//! for retry decisions without string matching.

use thiserror::Error;

/// Errors that can occur when asking an LLM provider for a verdict.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The model answered, but not with a verdict we could read.
    #[error("malformed verdict: {0}")]
    MalformedVerdict(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanence() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("m".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert!(!ProviderError::MalformedVerdict("{".into()).is_permanent());
    }

    #[test]
    fn retry_hint() {
        let err = ProviderError::RateLimited {
            retry_after_ms: 2500,
        };
        assert_eq!(err.retry_after_ms(), Some(2500));
        assert_eq!(err.to_string(), "rate limited, retry after 2500ms");
        assert_eq!(ProviderError::NetworkError("x".into()).retry_after_ms(), None);
    }
}
