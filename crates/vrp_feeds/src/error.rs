//! Provider error types.

use thiserror::Error;

/// Errors raised by a provider capability.
///
/// Sources never let these escape: they are logged and downgraded to a
/// missing reading or an empty series.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected the request with a rate-limit signal.
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// Provider name
        provider: String,
    },

    /// Network or I/O failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The payload could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider does not know the symbol or series.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl ProviderError {
    /// Create a rate-limit error
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this is the rate-limit signal that warrants a retry.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<csv::Error> for ProviderError {
    fn from(err: csv::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_detection() {
        assert!(ProviderError::rate_limited("options").is_rate_limited());
        assert!(!ProviderError::transport("connection reset").is_rate_limited());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::rate_limited("macro");
        assert_eq!(err.to_string(), "Rate limited by macro");
        let err = ProviderError::UnknownSymbol("XYZ".to_string());
        assert_eq!(err.to_string(), "Unknown symbol: XYZ");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: ProviderError = io.into();
        assert!(matches!(err, ProviderError::Transport(msg) if msg.contains("timed out")));
    }
}
