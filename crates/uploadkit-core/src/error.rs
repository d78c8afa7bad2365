//! Error types module
//!
//! `CoreError` covers malformed values handed to the core (crop specs, modifier
//! strings, settings). `UploadError` is the rejection reason carried by file and
//! dialog handles; it is `Clone` because every observer of a rejected handle
//! receives its own copy.

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how a rejection should be presented to the embedding host
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether submitting the same source again may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the end user
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid crop spec: {0}")]
    InvalidCropSpec(String),

    #[error("Invalid image shrink: {0}")]
    InvalidImageShrink(String),

    #[error("Invalid file info: {0}")]
    InvalidFileInfo(String),

    #[error("Invalid CDN URL: {0}")]
    InvalidCdnUrl(String),

    #[error("Invalid modifiers: {0}")]
    InvalidModifiers(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Reason a file or dialog handle was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Dialog cancelled")]
    Cancelled,
}

impl From<uuid::Error> for UploadError {
    fn from(err: uuid::Error) -> Self {
        UploadError::UnsupportedSource(format!("UUID parsing error: {}", err))
    }
}

impl From<CoreError> for UploadError {
    fn from(err: CoreError) -> Self {
        UploadError::UnsupportedSource(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        UploadError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Choose a different file"),
            LogLevel::Debug,
        ),
        UploadError::Transport(_) => (
            "TRANSPORT_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        UploadError::UnsupportedSource(_) => (
            "UNSUPPORTED_SOURCE",
            false,
            Some("Check the source kind and identifier"),
            LogLevel::Warn,
        ),
        UploadError::Cancelled => ("CANCELLED", true, None, LogLevel::Debug),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        upload_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_transport() {
        let err = UploadError::Transport("connection reset".to_string());
        assert_eq!(err.error_code(), "TRANSPORT_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert_eq!(err.to_string(), "Transport error: connection reset");
    }

    #[test]
    fn test_error_metadata_validation() {
        let err = UploadError::from(ValidationError::ImagesOnly);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.suggested_action(), Some("Choose a different file"));
    }

    #[test]
    fn test_uuid_error_is_unsupported_source() {
        let err: UploadError = uuid::Uuid::parse_str("not-a-uuid").unwrap_err().into();
        assert!(matches!(err, UploadError::UnsupportedSource(_)));
        assert_eq!(err.error_code(), "UNSUPPORTED_SOURCE");
    }
}
