//! Error types for request preparation.
//!
//! Building URLs and merging configuration never fail. Errors come from the
//! edges: parsing configuration documents, turning a merged configuration into
//! a transport request, and the transport itself.

use thiserror::Error;

/// Main error type for reqline operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP method is not a valid token
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Header name or value is not valid
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration document is malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Remote service could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Specialized result type for reqline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidMethod(_) => "INVALID_METHOD",
            Self::InvalidHeader(_) => "INVALID_HEADER",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::SerializationError(_) => "SERIALIZATION_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Returns true if the error originates from the transport rather than
    /// from the caller's configuration.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::Timeout(_) | Self::ServiceUnavailable(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
