//! Upload backend abstraction
//!
//! The widget never talks to an upload API directly; it goes through
//! `UploadBackend`. Chunking, retries and signing live behind this trait.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use uploadkit_core::{ImageInfo, ImageShrink, Settings, UploadError};

/// Transport errors
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

impl From<TransportError> for UploadError {
    fn from(err: TransportError) -> Self {
        UploadError::Transport(err.to_string())
    }
}

/// A file selected on the host side, held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl NativeFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// What the backend knows about a stored file
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub uuid: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub is_stored: bool,
    pub image_info: Option<ImageInfo>,
}

/// Per-request parameters derived from the resolved settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadParams {
    pub public_key: Option<String>,
    pub store: bool,
    pub secure_signature: Option<String>,
    pub secure_expire: Option<u64>,
    pub image_shrink: Option<ImageShrink>,
    /// Set when the payload is large enough for a multipart upload
    pub multipart: bool,
}

impl UploadParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            public_key: settings.public_key.clone(),
            store: !settings.do_not_store,
            secure_signature: settings.secure_signature.clone(),
            secure_expire: settings.secure_expire,
            image_shrink: settings.image_shrink,
            multipart: false,
        }
    }

    pub fn for_size(mut self, size: u64, multipart_min_size: u64) -> Self {
        self.multipart = size >= multipart_min_size;
        self
    }
}

/// Receives transfer progress as a fraction in `[0, 1]`
pub trait ProgressReporter: Send + Sync {
    fn report(&self, fraction: f64);
}

impl<F> ProgressReporter for F
where
    F: Fn(f64) + Send + Sync,
{
    fn report(&self, fraction: f64) {
        self(fraction)
    }
}

/// Upload backend trait
///
/// Implementations must be safe to share between concurrently resolving
/// file handles.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Look up an already uploaded file
    async fn file_info(&self, uuid: Uuid, params: &UploadParams) -> TransportResult<RemoteFile>;

    /// Upload an in-memory file
    async fn upload_file(
        &self,
        file: NativeFile,
        params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile>;

    /// Ask the backend to fetch and host a remote URL
    async fn upload_from_url(
        &self,
        url: &str,
        params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile>;
}
