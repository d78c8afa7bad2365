use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use uploadkit_core::ImageInfo;

use crate::traits::{
    NativeFile, ProgressReporter, RemoteFile, TransportError, TransportResult, UploadBackend,
    UploadParams,
};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// In-memory upload backend
///
/// Keeps uploaded files in a map and serves URL uploads from registered
/// fixtures. Images are identified by sniffing the payload header.
#[derive(Clone)]
pub struct InMemoryBackend {
    files: Arc<RwLock<HashMap<Uuid, RemoteFile>>>,
    remote: Arc<RwLock<HashMap<String, NativeFile>>>,
    chunk_size: usize,
    public_key: Option<String>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            remote: Arc::new(RwLock::new(HashMap::new())),
            chunk_size: DEFAULT_CHUNK_SIZE,
            public_key: None,
        }
    }

    /// Only accept requests carrying this public key
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Report progress every `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Make `url` fetchable by `upload_from_url`
    pub async fn register_remote(&self, url: impl Into<String>, file: NativeFile) {
        self.remote.write().await.insert(url.into(), file);
    }

    /// Insert a file as if it had been uploaded earlier
    pub async fn insert(&self, file: RemoteFile) {
        self.files.write().await.insert(file.uuid, file);
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    fn check_key(&self, params: &UploadParams) -> TransportResult<()> {
        match (&self.public_key, &params.public_key) {
            (None, _) => Ok(()),
            (Some(expected), Some(given)) if expected == given => Ok(()),
            (Some(_), Some(given)) => Err(TransportError::Rejected(format!(
                "Unknown public key: {}",
                given
            ))),
            (Some(_), None) => Err(TransportError::Rejected(
                "Public key is required".to_string(),
            )),
        }
    }

    async fn store(
        &self,
        file: NativeFile,
        params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile> {
        if file.data.is_empty() {
            return Err(TransportError::UploadFailed(format!(
                "File is empty: {}",
                file.name
            )));
        }

        let total = file.data.len();
        let mut sent = 0usize;
        while sent < total {
            sent = (sent + self.chunk_size).min(total);
            progress.report(sent as f64 / total as f64);
            tokio::task::yield_now().await;
        }

        let (image_info, sniffed_mime) = identify_image(&file.data);
        let mime_type = file
            .mime_type
            .clone()
            .or(sniffed_mime)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let remote = RemoteFile {
            uuid: Uuid::new_v4(),
            name: file.name,
            size: total as u64,
            mime_type,
            is_stored: params.store,
            image_info,
        };

        tracing::debug!(
            file_uuid = %remote.uuid,
            size = remote.size,
            multipart = params.multipart,
            is_image = remote.image_info.is_some(),
            "Stored file in memory backend"
        );

        self.files.write().await.insert(remote.uuid, remote.clone());
        Ok(remote)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Read image dimensions and format from the payload header
fn identify_image(data: &[u8]) -> (Option<ImageInfo>, Option<String>) {
    let reader = match image::ImageReader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return (None, None),
    };
    let format = match reader.format() {
        Some(format) => format,
        None => return (None, None),
    };
    let mime_type = format.to_mime_type().to_string();

    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => {
            let name = format!("{:?}", format).to_uppercase();
            (
                Some(ImageInfo::new(width, height, name, None)),
                Some(mime_type),
            )
        }
        _ => (None, Some(mime_type)),
    }
}

#[async_trait]
impl UploadBackend for InMemoryBackend {
    async fn file_info(&self, uuid: Uuid, params: &UploadParams) -> TransportResult<RemoteFile> {
        self.check_key(params)?;
        self.files
            .read()
            .await
            .get(&uuid)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(uuid.to_string()))
    }

    async fn upload_file(
        &self,
        file: NativeFile,
        params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile> {
        self.check_key(params)?;
        self.store(file, params, progress).await
    }

    async fn upload_from_url(
        &self,
        url: &str,
        params: &UploadParams,
        progress: &dyn ProgressReporter,
    ) -> TransportResult<RemoteFile> {
        self.check_key(params)?;
        let file = self
            .remote
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::FetchFailed(format!("Unreachable URL: {}", url)))?;
        self.store(file, params, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // 1x1 PNG
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[tokio::test]
    async fn test_upload_reports_progress_and_identifies_image() {
        let backend = InMemoryBackend::new().with_chunk_size(16);
        let seen = Mutex::new(Vec::new());
        let reporter = |fraction: f64| seen.lock().unwrap().push(fraction);

        let remote = backend
            .upload_file(
                NativeFile::new("pixel.png", PNG.to_vec()),
                &UploadParams::default(),
                &reporter,
            )
            .await
            .unwrap();

        assert_eq!(remote.mime_type, "image/png");
        let image_info = remote.image_info.unwrap();
        assert_eq!(image_info.dimensions(), (1, 1));
        assert_eq!(image_info.format, "PNG");

        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(1.0));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_upload_plain_file() {
        let backend = InMemoryBackend::new();
        let remote = backend
            .upload_file(
                NativeFile::new("notes.txt", b"hello".to_vec()).with_mime_type("text/plain"),
                &UploadParams::default(),
                &|_: f64| {},
            )
            .await
            .unwrap();
        assert!(remote.image_info.is_none());
        assert_eq!(remote.mime_type, "text/plain");

        let fetched = backend
            .file_info(remote.uuid, &UploadParams::default())
            .await
            .unwrap();
        assert_eq!(fetched, remote);
    }

    #[tokio::test]
    async fn test_rejects_empty_file_and_wrong_key() {
        let backend = InMemoryBackend::new().with_public_key("demo");
        let params = UploadParams {
            public_key: Some("demo".to_string()),
            ..Default::default()
        };
        let err = backend
            .upload_file(NativeFile::new("empty", Vec::new()), &params, &|_: f64| {})
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UploadFailed(_)));

        let err = backend
            .file_info(Uuid::new_v4(), &UploadParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_upload_from_url() {
        let backend = InMemoryBackend::new();
        backend
            .register_remote(
                "https://example.com/pixel.png",
                NativeFile::new("pixel.png", PNG.to_vec()),
            )
            .await;

        let remote = backend
            .upload_from_url(
                "https://example.com/pixel.png",
                &UploadParams::default(),
                &|_: f64| {},
            )
            .await
            .unwrap();
        assert!(remote.image_info.is_some());

        let err = backend
            .upload_from_url("https://example.com/missing", &UploadParams::default(), &|_: f64| {})
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::FetchFailed(_)));
    }
}
