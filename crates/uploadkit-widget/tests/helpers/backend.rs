//! Backends that misbehave on purpose.

use async_trait::async_trait;
use uploadkit_transport::{
    NativeFile, ProgressReporter, RemoteFile, TransportError, TransportResult, UploadBackend,
    UploadParams,
};
use uuid::Uuid;

/// Reports some progress, then fails every request
pub struct FailingBackend;

#[async_trait]
impl UploadBackend for FailingBackend {
    async fn file_info(&self, uuid: Uuid, _params: &UploadParams) -> TransportResult<RemoteFile> {
        Err(TransportError::NotFound(uuid.to_string()))
    }

    async fn upload_file(
        &self,
        _file: NativeFile,
        _params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile> {
        progress.report(0.5);
        Err(TransportError::UploadFailed("connection reset".to_string()))
    }

    async fn upload_from_url(
        &self,
        url: &str,
        _params: &UploadParams,
        _progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile> {
        Err(TransportError::FetchFailed(url.to_string()))
    }
}
