// src/error.rs
//! Application error types with structured error handling.
//!
//! Error variants name what went wrong and where; `classify` turns any of
//! them into the four retry classes the retry engine dispatches on.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Remote API error codes as a typed vocabulary.
///
/// The document service answers with a numeric `code` in its JSON envelope;
/// the codes this client reacts to get their own variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorCode {
    /// Request frequency limit hit — back off and retry
    RateLimited,
    /// Request parameters failed the service's validation
    InvalidParameter,
    /// The referenced document or block does not exist
    NotFound,
    /// The token lacks permission for this resource
    Forbidden,
    /// Access token is missing, invalid or expired
    AccessTokenInvalid,
    /// Service internal error
    InternalError,
    /// Service is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// A numeric code this client doesn't recognize
    Unknown(i64),
}

impl RemoteErrorCode {
    /// Parse the envelope's numeric code into the typed vocabulary.
    pub fn from_api_code(code: i64) -> Self {
        match code {
            99991400 => Self::RateLimited,
            99991661 | 99991663 | 99991668 | 99991671 => Self::AccessTokenInvalid,
            99991672 | 99991679 | 1770032 => Self::Forbidden,
            1770001 | 99992402 => Self::InvalidParameter,
            1770002 | 1770003 => Self::NotFound,
            1770005 | 1770006 => Self::InternalError,
            other => Self::Unknown(other),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            503 => Self::ServiceUnavailable,
            500 => Self::InternalError,
            other => Self::HttpStatus(other),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::InvalidParameter => write!(f, "invalid_parameter"),
            Self::NotFound => write!(f, "not_found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::AccessTokenInvalid => write!(f, "access_token_invalid"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "code_{}", code),
        }
    }
}

/// How the retry engine should treat a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed source or invalid parameters, never retried
    Permanent,
    /// Quota exceeded, always eligible for another attempt
    RateLimited,
    /// 5xx-class or transport hiccup, retried within the failure budget
    Retryable,
    /// Unrecognised failure, not retried
    Unknown,
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Remote service returned an error ({code}): {message}")]
    RemoteService {
        code: RemoteErrorCode,
        message: String,
        status: Option<u16>,
        /// Seconds until the rate-limit quota resets, when the server says.
        reset_after: Option<u64>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Gave up after {attempts} attempts (attempt ceiling reached): {last}")]
    RetryCeilingReached { attempts: u32, last: Box<AppError> },

    #[error("Retries exhausted after {failures} failures: {last}")]
    RetriesExhausted { failures: u32, last: Box<AppError> },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Block creation failed at batch {batch}: {source}")]
    BatchCreationFailed {
        batch: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("Output delivery failed: {}", failures.join(", "))]
    DeliveryFailed { failures: Vec<String> },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Shorthand for a remote error built from a code and message.
    pub fn remote(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        AppError::RemoteService {
            code,
            message: message.into(),
            status: None,
            reset_after: None,
        }
    }

    /// Maps the error onto the retry engine's classes.
    pub fn classify(&self) -> ErrorClass {
        match self {
            AppError::RemoteService { code, message, .. } => {
                if code.is_rate_limited() {
                    return ErrorClass::RateLimited;
                }
                if mentions_syntax_error(message) {
                    return ErrorClass::Permanent;
                }
                match code {
                    RemoteErrorCode::InvalidParameter
                    | RemoteErrorCode::NotFound
                    | RemoteErrorCode::Forbidden
                    | RemoteErrorCode::AccessTokenInvalid => ErrorClass::Permanent,
                    RemoteErrorCode::InternalError | RemoteErrorCode::ServiceUnavailable => {
                        ErrorClass::Retryable
                    }
                    RemoteErrorCode::HttpStatus(status) if *status >= 500 => {
                        ErrorClass::Retryable
                    }
                    RemoteErrorCode::HttpStatus(status) if *status >= 400 => {
                        ErrorClass::Permanent
                    }
                    _ => ErrorClass::Unknown,
                }
            }
            AppError::NetworkFailure(err) => {
                if err.is_timeout() || err.is_connect() {
                    ErrorClass::Retryable
                } else if err.status().is_some_and(|s| s.as_u16() == 429) {
                    ErrorClass::RateLimited
                } else if err.status().is_some_and(|s| s.is_server_error()) {
                    ErrorClass::Retryable
                } else {
                    ErrorClass::Unknown
                }
            }
            AppError::MalformedResponse(_)
            | AppError::ValidationError(_)
            | AppError::MissingConfiguration(_)
            | AppError::Cancelled => ErrorClass::Permanent,
            AppError::RetryCeilingReached { last, .. } | AppError::RetriesExhausted { last, .. } => {
                last.classify()
            }
            _ => ErrorClass::Unknown,
        }
    }

    /// Server-provided wait before the quota resets.
    pub fn reset_hint(&self) -> Option<Duration> {
        match self {
            AppError::RemoteService {
                reset_after: Some(seconds),
                ..
            } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }

    /// True for diagram-source errors the service reports as syntax failures.
    pub fn is_syntax_error(&self) -> bool {
        match self {
            AppError::RemoteService { message, .. } => mentions_syntax_error(message),
            AppError::RetryCeilingReached { last, .. } | AppError::RetriesExhausted { last, .. } => {
                last.is_syntax_error()
            }
            _ => false,
        }
    }
}

fn mentions_syntax_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("syntax") || lower.contains("parse error")
}

// Allow converting from anyhow::Error, preserving error chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: format!("{:#}", err),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<std::fmt::Error> for AppError {
    fn from(err: std::fmt::Error) -> Self {
        AppError::InternalError {
            message: "Formatting error".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
