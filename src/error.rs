//! Error types for the Nebula bot

use std::time::Duration;

use thiserror::Error;

/// Result type alias for Nebula operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Nebula bot
///
/// Provider failures are pre-classified at the client boundary:
/// [`Error::Transient`] and [`Error::RateLimited`] are eligible for retry,
/// [`Error::Permanent`] is surfaced immediately. Buffer absence is never an
/// error; it is reported through `Option`/`bool` results.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Retryable provider failure (5xx-equivalent, transient network)
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Provider asked us to slow down (429-equivalent)
    #[error("rate limited by provider")]
    RateLimited {
        /// Provider-supplied wait before the next attempt, if any
        retry_after: Option<Duration>,
    },

    /// Request-shape failure that retrying cannot fix (4xx-equivalent)
    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// Audio normalization failure
    #[error("audio error: {0}")]
    Audio(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this failure is worth retrying
    ///
    /// Transport-level `reqwest` timeouts and connection failures count as
    /// transient; a hung call bounded by the client timeout re-enters the
    /// normal retry path.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) | Self::RateLimited { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Provider-supplied delay before the next attempt, if any
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::Transient("503".into()).is_transient());
        assert!(
            Error::RateLimited {
                retry_after: None
            }
            .is_transient()
        );
        assert!(!Error::Permanent("400".into()).is_transient());
        assert!(!Error::Config("missing".into()).is_transient());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        let limited = Error::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(Error::Transient("x".into()).retry_after(), None);
    }
}
