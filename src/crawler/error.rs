use thiserror::Error;

/// Classified failure of a single extraction
///
/// `Timeout` and `AntiBotChallenge` are transient and retried with backoff;
/// `ParseFailure` and `NotFound` are terminal for the URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Anti-bot challenge detected: {0}")]
    AntiBotChallenge(String),

    #[error("Failed to parse article: {0}")]
    ParseFailure(String),

    #[error("Page not available (HTTP {0})")]
    NotFound(u16),
}

impl ExtractionError {
    /// Stable name of the failure kind, used in failure records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::AntiBotChallenge(_) => "anti_bot_challenge",
            Self::ParseFailure(_) => "parse_failure",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Errors a `RetryPolicy` knows how to classify
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ExtractionError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::AntiBotChallenge(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ExtractionError::Timeout("t".into()).is_retryable());
        assert!(ExtractionError::AntiBotChallenge("c".into()).is_retryable());
        assert!(!ExtractionError::ParseFailure("p".into()).is_retryable());
        assert!(!ExtractionError::NotFound(404).is_retryable());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ExtractionError::Timeout(String::new()).kind(), "timeout");
        assert_eq!(ExtractionError::NotFound(410).kind(), "not_found");
    }
}
