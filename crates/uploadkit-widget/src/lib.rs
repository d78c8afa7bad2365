//! uploadkit widget library
//!
//! The host-facing API: resolve files from several sources into observable
//! handles, run selection dialogs with tabs, crop images into CDN modifiers
//! and extend the widget with plugins and custom tabs.

pub mod callbacks;
pub mod collection;
pub mod crop;
pub mod css;
pub mod deferred;
pub mod dialog;
pub mod error;
pub mod file;
pub mod host;
pub mod plugin;
pub mod registry;
pub mod source;
pub mod telemetry;

// Re-export commonly used types
pub use callbacks::{CallbackId, Callbacks};
pub use collection::FileCollection;
pub use crop::{CropRect, CropWidget, ImageElement};
pub use css::{StyleEntry, TabsCss};
pub use deferred::{Deferred, Promise, PromiseState};
pub use dialog::{Dialog, InitialSelection, Selection, TabButton, TabPanel, PREVIEW_TAB};
pub use error::WidgetError;
pub use file::{FileDeferred, FilePromise};
pub use host::Uploadcare;
pub use plugin::PluginApi;
pub use registry::{TabContext, TabRegistry, TabRenderer};
pub use source::{FileSource, InputRegistry};

pub use uploadkit_core::{
    CropMode, CropSettings, DialogOptions, FileInfo, ImageInfo, Settings, UploadError, UploadInfo,
    UploadState, ValidationError, WidgetConfig,
};
#[cfg(feature = "backend-memory")]
pub use uploadkit_transport::InMemoryBackend;
pub use uploadkit_transport::{NativeFile, UploadBackend};
