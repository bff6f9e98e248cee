use thiserror::Error;

/// Result type for patentsearch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patentsearch operations
///
/// The variants follow the failure classes of the external services:
/// transport problems and most HTTP statuses are retryable, malformed payloads
/// and missing mandatory fields are not.
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or timeout talking to an external service
    #[error("Transport error: {0}")]
    Transport(String),

    /// External service answered with a non-success status
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body could not be decoded, even after repair
    #[error("Decode error: {0}")]
    Decode(String),

    /// Response decoded but does not follow the expected envelope
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// External search service reported an error inside its envelope
    #[error("Search service error: {0}")]
    Service(String),

    /// A mandatory field is missing (the record is dropped)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Enrichment of a single record failed
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation was cancelled or exceeded its deadline
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates a search service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Creates a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an enrichment error
    pub fn enrichment(msg: impl Into<String>) -> Self {
        Self::Enrichment(msg.into())
    }

    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the failed operation may succeed if attempted again.
    ///
    /// Transport failures, 429 and 5xx are retryable. Other 4xx statuses,
    /// decode and validation failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this is a rate-limit rejection (HTTP 429)
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 429, .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::http_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        Self::transport(err.to_string())
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(Error::transport("connection reset").is_retryable());
        assert!(Error::http_status(429, "slow down").is_retryable());
        assert!(Error::http_status(503, "unavailable").is_retryable());
        assert!(!Error::http_status(404, "not found").is_retryable());
        assert!(!Error::http_status(401, "bad key").is_retryable());
        assert!(!Error::decode("garbage").is_retryable());
        assert!(!Error::validation("no title").is_retryable());
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(Error::http_status(429, "").is_rate_limited());
        assert!(!Error::http_status(500, "").is_rate_limited());
        assert!(!Error::transport("timeout").is_rate_limited());
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk full"));
        let err = io.context("Failed to write cache").unwrap_err();
        assert_eq!(err.to_string(), "Failed to write cache: disk full");
    }
}
