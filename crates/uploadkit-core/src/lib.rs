//! uploadkit core library
//!
//! This crate provides the value types, error types, configuration and
//! validation shared by the transport and widget crates.

pub mod config;
pub mod error;
pub mod models;
pub mod transform_url;
pub mod validation;

// Re-export commonly used types
pub use config::WidgetConfig;
pub use error::{CoreError, ErrorMetadata, LogLevel, UploadError};
pub use models::{
    CropMode, CropSettings, DialogOptions, FileInfo, ImageInfo, ImageShrink, Settings, UploadInfo,
    UploadState,
};
pub use transform_url::{build_modifiers, parse_modifiers, CdnUrl, ModifierOp};
pub use validation::{ValidationError, Validator};
