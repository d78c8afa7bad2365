//! Widget errors
//!
//! `WidgetError` is returned synchronously by widget operations (opening a
//! dialog, switching tabs, editing a crop). Asynchronous outcomes of file and
//! dialog handles are rejected with `UploadError` instead.

use thiserror::Error;
use uploadkit_core::{CoreError, ErrorMetadata, LogLevel};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("Crop widget has been destroyed")]
    CropDestroyed,

    #[error("Invalid crop modifiers: {0}")]
    InvalidModifiers(String),

    #[error("Selection of {count} file(s) is outside the allowed range {min}..={max}")]
    SelectionBounds { count: usize, min: u32, max: u32 },

    #[error("Dialog is already closed")]
    DialogClosed,

    #[error("No async runtime available")]
    NoRuntime,

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn widget_error_static_metadata(
    err: &WidgetError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        WidgetError::UnknownTab(_) => (
            "UNKNOWN_TAB",
            false,
            Some("Register the tab or list it in the tabs setting"),
            LogLevel::Warn,
        ),
        WidgetError::CropDestroyed => ("CROP_DESTROYED", false, None, LogLevel::Warn),
        WidgetError::InvalidModifiers(_) => (
            "INVALID_MODIFIERS",
            false,
            Some("Pass modifiers produced by a crop widget"),
            LogLevel::Debug,
        ),
        WidgetError::SelectionBounds { .. } => (
            "SELECTION_BOUNDS",
            true,
            Some("Add or remove files before confirming"),
            LogLevel::Debug,
        ),
        WidgetError::DialogClosed => ("DIALOG_CLOSED", false, None, LogLevel::Debug),
        WidgetError::NoRuntime => (
            "NO_RUNTIME",
            false,
            Some("Create the widget from within a Tokio runtime"),
            LogLevel::Error,
        ),
        WidgetError::Core(_) => (
            "INVALID_SETTINGS",
            false,
            Some("Check the widget options"),
            LogLevel::Warn,
        ),
    }
}

impl ErrorMetadata for WidgetError {
    fn error_code(&self) -> &'static str {
        widget_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        widget_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        widget_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        widget_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_bounds_message() {
        let err = WidgetError::SelectionBounds {
            count: 0,
            min: 1,
            max: 3,
        };
        assert_eq!(
            err.to_string(),
            "Selection of 0 file(s) is outside the allowed range 1..=3"
        );
        assert_eq!(err.error_code(), "SELECTION_BOUNDS");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: WidgetError = CoreError::InvalidSettings("tabs must not be empty".into()).into();
        assert_eq!(err.to_string(), "Invalid settings: tabs must not be empty");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }
}
