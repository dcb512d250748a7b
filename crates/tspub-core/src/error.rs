//! Error types module
//!
//! Every fallible operation of the publishing pipeline returns a
//! [`PublishError`]. Variants follow the failure taxonomy of a publishing run:
//! local validation, transport, credentials, remote rejections, server-side
//! processing and upload timeouts. [`PublishError::is_retryable`] separates
//! transient failures from terminal ones so callers can decide per stage.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures, e.g. a missing local file
    Debug,
    /// Recoverable issues such as rate limiting
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Local input is missing, unreadable or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure on any remote call.
    #[error("Network error: {0}")]
    Network(String),

    /// Credential refresh or API token rejected.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Non-2xx answer from a draft, attach or publish call.
    #[error("Remote rejected request with status {status}: {body}")]
    RemoteRejection { status: u16, body: String },

    /// Upload job reached a terminal status other than success.
    #[error("Processing failed for {file}: status {status}{}", message.as_deref().map(|m| format!(" ({})", m)).unwrap_or_default())]
    ProcessingFailure {
        file: String,
        status: String,
        message: Option<String>,
    },

    /// Upload job still pending when the upload timeout elapsed.
    #[error("Processing of {file} timed out after {elapsed_secs}s")]
    Timeout { file: String, elapsed_secs: u64 },

    /// Operation invoked in a pipeline state that does not allow it.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            PublishError::Validation(_) => "VALIDATION_ERROR",
            PublishError::Network(_) => "NETWORK_ERROR",
            PublishError::Auth(_) => "AUTH_ERROR",
            PublishError::RemoteRejection { .. } => "REMOTE_REJECTION",
            PublishError::ProcessingFailure { .. } => "PROCESSING_FAILURE",
            PublishError::Timeout { .. } => "TIMEOUT",
            PublishError::Precondition(_) => "PRECONDITION_FAILED",
            PublishError::Decode(_) => "DECODE_ERROR",
            PublishError::Storage(_) => "STORAGE_ERROR",
            PublishError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the failed operation may succeed if issued again.
    ///
    /// Transport failures, rate limiting (429) and server errors (5xx) are
    /// transient. Everything else needs an operator to change something first.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::Network(_) | PublishError::Storage(_) => true,
            PublishError::RemoteRejection { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            PublishError::Validation(_) | PublishError::Precondition(_) => LogLevel::Debug,
            err if err.is_retryable() => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    /// Map an HTTP status of a rejected call. 401/403 become [`PublishError::Auth`].
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => PublishError::Auth(format!("status {}: {}", status, body)),
            _ => PublishError::RemoteRejection { status, body },
        }
    }
}

impl From<io::Error> for PublishError {
    fn from(err: io::Error) -> Self {
        PublishError::Validation(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Decode(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for PublishError {
    fn from(err: validator::ValidationErrors) -> Self {
        PublishError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(PublishError::Network("reset".into()).is_retryable());
        assert!(PublishError::RemoteRejection {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(PublishError::RemoteRejection {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!PublishError::RemoteRejection {
            status: 422,
            body: String::new()
        }
        .is_retryable());
        assert!(!PublishError::Auth("expired".into()).is_retryable());
        assert!(!PublishError::Validation("missing".into()).is_retryable());
        assert!(!PublishError::Timeout {
            file: "a.max".into(),
            elapsed_secs: 90
        }
        .is_retryable());
    }

    #[test]
    fn test_from_status_maps_auth() {
        assert!(matches!(
            PublishError::from_status(401, "nope".into()),
            PublishError::Auth(_)
        ));
        assert!(matches!(
            PublishError::from_status(404, "nope".into()),
            PublishError::RemoteRejection { status: 404, .. }
        ));
    }

    #[test]
    fn test_processing_failure_message() {
        let err = PublishError::ProcessingFailure {
            file: "model.max".into(),
            status: "failure".into(),
            message: Some("virus detected".into()),
        };
        assert_eq!(
            err.to_string(),
            "Processing failed for model.max: status failure (virus detected)"
        );
        assert_eq!(err.error_code(), "PROCESSING_FAILURE");
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
