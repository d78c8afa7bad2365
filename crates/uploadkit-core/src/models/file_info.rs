use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::transform_url::CdnUrl;

/// Decoded image metadata, present only for files identified as images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub dpi: Option<u32>,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32, format: impl Into<String>, dpi: Option<u32>) -> Self {
        Self {
            width,
            height,
            format: format.into(),
            dpi,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidFileInfo(format!(
                "image dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.format.trim().is_empty() {
            return Err(CoreError::InvalidFileInfo(
                "image format must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Descriptor of an identified file
///
/// Values are immutable once handed to the embedding application; derived
/// variants (for example a cropped version) are new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub uuid: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub is_stored: bool,
    pub is_image: bool,
    pub cdn_url: String,
    pub cdn_url_modifiers: Option<String>,
    pub original_url: String,
    pub original_image_info: Option<ImageInfo>,
}

impl FileInfo {
    /// Build a file descriptor; `is_image` follows from the presence of image metadata.
    pub fn new(
        uuid: Uuid,
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        original_image_info: Option<ImageInfo>,
        cdn_base: &str,
    ) -> Result<Self, CoreError> {
        if let Some(ref image_info) = original_image_info {
            image_info.validate()?;
        }

        let original_url = CdnUrl::new(cdn_base, uuid).to_string();
        Ok(Self {
            uuid,
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            is_stored: false,
            is_image: original_image_info.is_some(),
            cdn_url: original_url.clone(),
            cdn_url_modifiers: None,
            original_url,
            original_image_info,
        })
    }

    pub fn stored(mut self, is_stored: bool) -> Self {
        self.is_stored = is_stored;
        self
    }

    /// Check the image flag against the image metadata block
    pub fn validate(&self) -> Result<(), CoreError> {
        match (self.is_image, &self.original_image_info) {
            (true, Some(image_info)) => image_info.validate(),
            (false, None) => Ok(()),
            (true, None) => Err(CoreError::InvalidFileInfo(format!(
                "file {} is flagged as image but has no image info",
                self.uuid
            ))),
            (false, Some(_)) => Err(CoreError::InvalidFileInfo(format!(
                "file {} is not an image but carries image info",
                self.uuid
            ))),
        }
    }

    /// Return a copy pointing at the same file with different URL modifiers.
    ///
    /// Empty or `None` modifiers yield the plain CDN URL.
    pub fn with_modifiers(&self, cdn_base: &str, modifiers: Option<&str>) -> Self {
        let modifiers = modifiers
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let cdn_url = CdnUrl::new(cdn_base, self.uuid)
            .with_modifiers(modifiers.clone())
            .to_string();

        Self {
            cdn_url,
            cdn_url_modifiers: modifiers,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDN: &str = "https://ucarecdn.com";

    #[test]
    fn test_non_image_has_no_image_info() {
        let info = FileInfo::new(Uuid::new_v4(), "a.txt", 3, "text/plain", None, CDN).unwrap();
        assert!(!info.is_image);
        assert!(info.original_image_info.is_none());
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_image_requires_well_formed_info() {
        let err = FileInfo::new(
            Uuid::new_v4(),
            "a.png",
            3,
            "image/png",
            Some(ImageInfo::new(0, 10, "PNG", None)),
            CDN,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidFileInfo(_)));
    }

    #[test]
    fn test_validate_detects_flag_mismatch() {
        let mut info =
            FileInfo::new(Uuid::new_v4(), "a.txt", 3, "text/plain", None, CDN).unwrap();
        info.is_image = true;
        assert!(info.validate().is_err());
    }

    #[test]
    fn test_with_modifiers_rebuilds_cdn_url() {
        let uuid = Uuid::parse_str("8e3c0b2a-4d1f-4a57-9b5e-6f0c1d2e3f40").unwrap();
        let info = FileInfo::new(
            uuid,
            "a.png",
            3,
            "image/png",
            Some(ImageInfo::new(10, 10, "PNG", None)),
            CDN,
        )
        .unwrap();

        let cropped = info.with_modifiers(CDN, Some("-/crop/5x5/0,0/"));
        assert_eq!(
            cropped.cdn_url,
            "https://ucarecdn.com/8e3c0b2a-4d1f-4a57-9b5e-6f0c1d2e3f40/-/crop/5x5/0,0/"
        );
        assert_eq!(cropped.cdn_url_modifiers.as_deref(), Some("-/crop/5x5/0,0/"));
        assert_eq!(cropped.original_url, info.original_url);

        let plain = cropped.with_modifiers(CDN, None);
        assert_eq!(plain.cdn_url, info.cdn_url);
        assert!(plain.cdn_url_modifiers.is_none());
    }

    #[test]
    fn test_serializes_with_widget_field_names() {
        let info = FileInfo::new(Uuid::new_v4(), "a.txt", 3, "text/plain", None, CDN).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["mimeType"], "text/plain");
        assert_eq!(json["isImage"], false);
        assert!(json["originalImageInfo"].is_null());
        assert!(json["cdnUrlModifiers"].is_null());
    }
}
