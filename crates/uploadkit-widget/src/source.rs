//! File sources and their resolution
//!
//! A source is turned into a file handle by uploading (or looking up) the
//! file through an [`UploadBackend`], then validating the resulting
//! [`FileInfo`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use uploadkit_core::validation::{images_only, run_validators};
use uploadkit_core::{CdnUrl, FileInfo, Settings, UploadError, UploadInfo};
use uploadkit_transport::{NativeFile, RemoteFile, UploadBackend, UploadParams};
use uuid::Uuid;

use crate::file::FileDeferred;

/// Where a file comes from
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// A file already on the CDN: bare UUID or CDN URL, optionally with modifiers
    Uploaded(String),
    /// A remote URL the backend fetches
    Url(String),
    /// A file held by the host
    Object(NativeFile),
    /// The value of an input registered with [`InputRegistry`]
    Input(String),
}

impl FileSource {
    /// Build a source from its string kind.
    ///
    /// `object` sources carry a native file and have no string form.
    pub fn parse(kind: &str, identifier: impl Into<String>) -> Result<Self, UploadError> {
        let identifier = identifier.into();
        match kind.trim().to_ascii_lowercase().as_str() {
            "uploaded" => Ok(Self::Uploaded(identifier)),
            "url" => Ok(Self::Url(identifier)),
            "input" => Ok(Self::Input(identifier)),
            "object" => Err(UploadError::UnsupportedSource(
                "object sources must be built from a native file".to_string(),
            )),
            other => Err(UploadError::UnsupportedSource(format!(
                "unknown source kind: {}",
                other
            ))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Uploaded(_) => "uploaded",
            Self::Url(_) => "url",
            Self::Object(_) => "object",
            Self::Input(_) => "input",
        }
    }
}

impl From<NativeFile> for FileSource {
    fn from(file: NativeFile) -> Self {
        Self::Object(file)
    }
}

/// Inputs the host has registered as file sources, by id
#[derive(Clone, Default)]
pub struct InputRegistry {
    inputs: Arc<RwLock<HashMap<String, FileSource>>>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the value behind `id`
    pub fn register(&self, id: impl Into<String>, value: FileSource) -> Option<FileSource> {
        let id = id.into();
        tracing::debug!(input_id = %id, kind = value.kind(), "Input registered");
        self.inputs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, value)
    }

    pub fn remove(&self, id: &str) -> Option<FileSource> {
        self.inputs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
    }

    pub fn get(&self, id: &str) -> Option<FileSource> {
        self.inputs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

impl fmt::Debug for InputRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = self
            .inputs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f.debug_struct("InputRegistry")
            .field("inputs", &inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Split an `uploaded` identifier into UUID and optional modifiers
fn parse_uploaded(identifier: &str) -> Result<(Uuid, Option<String>), UploadError> {
    let identifier = identifier.trim();
    if let Ok(uuid) = Uuid::parse_str(identifier) {
        return Ok((uuid, None));
    }
    let url = CdnUrl::parse(identifier)?;
    Ok((url.uuid(), url.modifiers().map(str::to_string)))
}

fn check_remote_url(url: &str) -> Result<(), UploadError> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(UploadError::UnsupportedSource(format!(
            "only http and https URLs can be uploaded: {}",
            url
        )))
    }
}

/// Drive one source to a settled file handle
pub(crate) async fn resolve(
    source: FileSource,
    backend: Arc<dyn UploadBackend>,
    settings: Arc<Settings>,
    inputs: InputRegistry,
    deferred: FileDeferred,
) {
    let kind = source.kind();
    match fetch(source, backend.as_ref(), &settings, &inputs, &deferred).await {
        Ok(info) => {
            tracing::debug!(file_uuid = %info.uuid, kind, "File ready");
            deferred.notify(UploadInfo::ready());
            deferred.resolve(info);
        }
        Err(err) => {
            tracing::debug!(error = %err, kind, "File rejected");
            deferred.reject(err);
        }
    }
}

async fn fetch(
    source: FileSource,
    backend: &dyn UploadBackend,
    settings: &Settings,
    inputs: &InputRegistry,
    deferred: &FileDeferred,
) -> Result<FileInfo, UploadError> {
    let source = match source {
        FileSource::Input(id) => match inputs.get(&id) {
            Some(FileSource::Input(_)) => {
                return Err(UploadError::UnsupportedSource(format!(
                    "input {} refers to another input",
                    id
                )))
            }
            Some(value) => value,
            None => {
                return Err(UploadError::UnsupportedSource(format!(
                    "no input registered as {}",
                    id
                )))
            }
        },
        other => other,
    };

    let params = UploadParams::from_settings(settings);
    let progress = {
        let deferred = deferred.clone();
        move |fraction: f64| {
            deferred.notify(UploadInfo::uploading(fraction));
        }
    };

    deferred.notify(UploadInfo::uploading(0.0));
    let (remote, modifiers) = match source {
        FileSource::Uploaded(identifier) => {
            let (uuid, modifiers) = parse_uploaded(&identifier)?;
            (backend.file_info(uuid, &params).await?, modifiers)
        }
        FileSource::Url(url) => {
            check_remote_url(&url)?;
            (
                backend.upload_from_url(url.trim(), &params, &progress).await?,
                None,
            )
        }
        FileSource::Object(file) => {
            let params = params.for_size(file.size(), settings.multipart_min_size);
            (backend.upload_file(file, &params, &progress).await?, None)
        }
        FileSource::Input(id) => {
            return Err(UploadError::UnsupportedSource(format!(
                "input {} could not be resolved",
                id
            )))
        }
    };
    deferred.notify(UploadInfo::uploaded());

    let info = file_info(remote, settings, modifiers.as_deref())?;
    if settings.images_only {
        images_only()(&info)?;
    }
    run_validators(&info, &settings.validators)?;
    Ok(info)
}

fn file_info(
    remote: RemoteFile,
    settings: &Settings,
    modifiers: Option<&str>,
) -> Result<FileInfo, UploadError> {
    let info = FileInfo::new(
        remote.uuid,
        remote.name,
        remote.size,
        remote.mime_type,
        remote.image_info,
        &settings.cdn_base,
    )
    .map_err(|err| UploadError::Transport(format!("backend returned {}", err)))?
    .stored(remote.is_stored);

    Ok(match modifiers {
        Some(modifiers) => info.with_modifiers(&settings.cdn_base, Some(modifiers)),
        None => info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_kinds() {
        assert_eq!(
            FileSource::parse("url", "https://example.com/a.png").unwrap(),
            FileSource::Url("https://example.com/a.png".to_string())
        );
        assert_eq!(
            FileSource::parse("Uploaded", "abc").unwrap().kind(),
            "uploaded"
        );
        assert!(matches!(
            FileSource::parse("object", "x"),
            Err(UploadError::UnsupportedSource(_))
        ));
        assert!(matches!(
            FileSource::parse("ftp", "x"),
            Err(UploadError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_parse_uploaded_identifier() {
        let uuid = Uuid::new_v4();
        assert_eq!(parse_uploaded(&uuid.to_string()).unwrap(), (uuid, None));

        let url = format!("https://ucarecdn.com/{}/-/crop/10x10/0,0/", uuid);
        let (parsed, modifiers) = parse_uploaded(&url).unwrap();
        assert_eq!(parsed, uuid);
        assert_eq!(modifiers.as_deref(), Some("-/crop/10x10/0,0/"));

        assert!(matches!(
            parse_uploaded("not a file"),
            Err(UploadError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_remote_url_scheme() {
        assert!(check_remote_url("https://example.com/x").is_ok());
        assert!(check_remote_url("ftp://example.com/x").is_err());
    }

    #[test]
    fn test_input_registry() {
        let inputs = InputRegistry::new();
        assert!(inputs
            .register("avatar", FileSource::Url("https://example.com".into()))
            .is_none());
        assert!(inputs.contains("avatar"));
        assert_eq!(inputs.remove("avatar").map(|s| s.kind()), Some("url"));
        assert!(inputs.get("avatar").is_none());
    }
}
