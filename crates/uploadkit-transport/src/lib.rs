//! uploadkit transport library
//!
//! This crate defines the `UploadBackend` trait the widget uses to reach an
//! upload API, plus an in-memory backend for embedding tests and demos.

#[cfg(feature = "backend-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "backend-memory")]
pub use memory::InMemoryBackend;
pub use traits::{
    NativeFile, ProgressReporter, RemoteFile, TransportError, TransportResult, UploadBackend,
    UploadParams,
};
