use std::fmt;
use std::sync::Arc;

use crate::models::{CropMode, FileInfo};
use crate::validation::{ValidationError, Validator};

/// Rewrites the preview URL of a file before it is displayed
pub type PreviewUrlCallback = Arc<dyn Fn(&str, &FileInfo) -> String + Send + Sync>;

/// Per-dialog overrides; every field is optional
///
/// `tab` selects the starting tab. When it is `None` the dialog opens on the
/// first enabled tab.
#[derive(Clone, Default)]
pub struct DialogOptions {
    pub tab: Option<String>,
    pub audio_bits_per_second: Option<u32>,
    pub cdn_base: Option<String>,
    pub crop: Option<CropMode>,
    pub do_not_store: Option<bool>,
    pub image_shrink: Option<String>,
    pub images_only: Option<bool>,
    pub input_accept_types: Option<String>,
    pub multipart_min_size: Option<u64>,
    pub multiple: Option<bool>,
    pub multiple_max: Option<u32>,
    pub multiple_min: Option<u32>,
    pub preferred_types: Option<String>,
    pub preview_proxy: Option<String>,
    pub preview_step: Option<bool>,
    pub preview_url_callback: Option<PreviewUrlCallback>,
    pub public_key: Option<String>,
    pub secure_expire: Option<u64>,
    pub secure_signature: Option<String>,
    pub tabs: Option<Vec<String>>,
    pub validators: Option<Vec<Validator>>,
    pub video_bits_per_second: Option<u32>,
}

impl DialogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = Some(multiple);
        self
    }

    pub fn multiple_bounds(mut self, min: u32, max: u32) -> Self {
        self.multiple_min = Some(min);
        self.multiple_max = Some(max);
        self
    }

    pub fn images_only(mut self, images_only: bool) -> Self {
        self.images_only = Some(images_only);
        self
    }

    pub fn crop(mut self, crop: &str) -> Self {
        self.crop = Some(CropMode::parse(crop));
        self
    }

    pub fn tabs<I, S>(mut self, tabs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tabs = Some(tabs.into_iter().map(Into::into).collect());
        self
    }

    pub fn preview_step(mut self, preview_step: bool) -> Self {
        self.preview_step = Some(preview_step);
        self
    }

    /// Append a validator to the option's validator list
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&FileInfo) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validators
            .get_or_insert_with(Vec::new)
            .push(Arc::new(validator));
        self
    }

    pub fn preview_url_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &FileInfo) -> String + Send + Sync + 'static,
    {
        self.preview_url_callback = Some(Arc::new(callback));
        self
    }

    pub fn secure(mut self, signature: impl Into<String>, expire: u64) -> Self {
        self.secure_signature = Some(signature.into());
        self.secure_expire = Some(expire);
        self
    }
}

impl fmt::Debug for DialogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogOptions")
            .field("tab", &self.tab)
            .field("crop", &self.crop)
            .field("images_only", &self.images_only)
            .field("multiple", &self.multiple)
            .field("multiple_min", &self.multiple_min)
            .field("multiple_max", &self.multiple_max)
            .field("tabs", &self.tabs)
            .field(
                "validators",
                &self.validators.as_ref().map(|v| v.len()),
            )
            .finish_non_exhaustive()
    }
}
