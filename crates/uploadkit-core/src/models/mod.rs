//! Domain models

pub mod crop;
pub mod file_info;
pub mod image_shrink;
pub mod options;
pub mod settings;
pub mod upload_info;

pub use crop::{CropMode, CropSettings};
pub use file_info::{FileInfo, ImageInfo};
pub use image_shrink::ImageShrink;
pub use options::{DialogOptions, PreviewUrlCallback};
pub use settings::{
    Settings, DEFAULT_CDN_BASE, DEFAULT_MULTIPART_MIN_SIZE, DEFAULT_MULTIPLE_MAX,
    DEFAULT_MULTIPLE_MIN, DEFAULT_TABS,
};
pub use upload_info::{UploadInfo, UploadState};
