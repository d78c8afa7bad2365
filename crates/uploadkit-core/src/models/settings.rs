use std::fmt;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::CoreError;
use crate::models::{CropSettings, DialogOptions, FileInfo, ImageShrink, PreviewUrlCallback};
use crate::validation::Validator;

pub const DEFAULT_CDN_BASE: &str = "https://ucarecdn.com";
pub const DEFAULT_MULTIPLE_MIN: u32 = 1;
pub const DEFAULT_MULTIPLE_MAX: u32 = 1000;
pub const DEFAULT_MULTIPART_MIN_SIZE: u64 = 25 * 1024 * 1024;
pub const DEFAULT_TABS: &[&str] = &[
    "file", "camera", "url", "facebook", "gdrive", "gphotos", "dropbox", "instagram", "evernote",
    "flickr", "onedrive",
];

/// Resolved dialog configuration: widget defaults with per-dialog overrides applied
#[derive(Clone)]
pub struct Settings {
    pub public_key: Option<String>,
    pub cdn_base: String,
    pub captions: bool,
    pub clearable: bool,
    /// Crop policies; empty when cropping is disabled
    pub crop: Vec<CropSettings>,
    pub images_only: bool,
    pub multiple: bool,
    pub multiple_min: u32,
    pub multiple_max: u32,
    pub do_not_store: bool,
    pub image_shrink: Option<ImageShrink>,
    pub input_accept_types: Option<String>,
    pub preferred_types: Vec<String>,
    pub multipart_min_size: u64,
    pub preview_step: bool,
    pub preview_proxy: Option<String>,
    pub preview_url_callback: Option<PreviewUrlCallback>,
    pub secure_signature: Option<String>,
    pub secure_expire: Option<u64>,
    pub tabs: Vec<String>,
    pub validators: Vec<Validator>,
    pub audio_bits_per_second: Option<u32>,
    pub video_bits_per_second: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            public_key: None,
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            captions: true,
            clearable: false,
            crop: Vec::new(),
            images_only: false,
            multiple: false,
            multiple_min: DEFAULT_MULTIPLE_MIN,
            multiple_max: DEFAULT_MULTIPLE_MAX,
            do_not_store: false,
            image_shrink: None,
            input_accept_types: None,
            preferred_types: Vec::new(),
            multipart_min_size: DEFAULT_MULTIPART_MIN_SIZE,
            preview_step: false,
            preview_proxy: None,
            preview_url_callback: None,
            secure_signature: None,
            secure_expire: None,
            tabs: DEFAULT_TABS.iter().map(|t| t.to_string()).collect(),
            validators: Vec::new(),
            audio_bits_per_second: None,
            video_bits_per_second: None,
        }
    }
}

impl Settings {
    /// Widget defaults with `options` applied
    pub fn from_options(options: &DialogOptions) -> Result<Self, CoreError> {
        Self::default().resolve(options)
    }

    /// Apply per-dialog options on top of these settings.
    ///
    /// Options that are `None` keep the current value; `validators` and `tabs`
    /// replace the current lists when given.
    pub fn resolve(&self, options: &DialogOptions) -> Result<Self, CoreError> {
        let mut settings = self.clone();

        if let Some(ref public_key) = options.public_key {
            settings.public_key = Some(public_key.clone());
        }
        if let Some(ref cdn_base) = options.cdn_base {
            settings.cdn_base = cdn_base.trim_end_matches('/').to_string();
        }
        if let Some(ref crop) = options.crop {
            settings.crop = crop.settings()?;
        }
        if let Some(do_not_store) = options.do_not_store {
            settings.do_not_store = do_not_store;
        }
        if let Some(ref image_shrink) = options.image_shrink {
            settings.image_shrink = Some(ImageShrink::parse(image_shrink)?);
        }
        if let Some(images_only) = options.images_only {
            settings.images_only = images_only;
        }
        if let Some(ref types) = options.input_accept_types {
            settings.input_accept_types = Some(types.clone());
        }
        if let Some(size) = options.multipart_min_size {
            settings.multipart_min_size = size;
        }
        if let Some(multiple) = options.multiple {
            settings.multiple = multiple;
        }
        if let Some(max) = options.multiple_max {
            settings.multiple_max = max;
        }
        if let Some(min) = options.multiple_min {
            settings.multiple_min = min;
        }
        if let Some(ref types) = options.preferred_types {
            settings.preferred_types = types.split_whitespace().map(str::to_string).collect();
        }
        if let Some(ref proxy) = options.preview_proxy {
            settings.preview_proxy = Some(proxy.clone());
        }
        if let Some(preview_step) = options.preview_step {
            settings.preview_step = preview_step;
        }
        if let Some(ref callback) = options.preview_url_callback {
            settings.preview_url_callback = Some(callback.clone());
        }
        if let Some(expire) = options.secure_expire {
            settings.secure_expire = Some(expire);
        }
        if let Some(ref signature) = options.secure_signature {
            settings.secure_signature = Some(signature.clone());
        }
        if let Some(ref tabs) = options.tabs {
            settings.tabs = tabs.clone();
        }
        if let Some(ref validators) = options.validators {
            settings.validators = validators.clone();
        }
        if let Some(bits) = options.audio_bits_per_second {
            settings.audio_bits_per_second = Some(bits);
        }
        if let Some(bits) = options.video_bits_per_second {
            settings.video_bits_per_second = Some(bits);
        }

        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    fn normalize(&mut self) {
        // Cropping always goes through the preview step
        if !self.crop.is_empty() {
            self.preview_step = true;
        }

        let mut seen = std::collections::HashSet::new();
        self.tabs = self
            .tabs
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.multiple_min < 1 {
            return Err(CoreError::InvalidSettings(
                "multiple_min must be at least 1".to_string(),
            ));
        }
        if self.multiple_min > self.multiple_max {
            return Err(CoreError::InvalidSettings(format!(
                "multiple_min ({}) exceeds multiple_max ({})",
                self.multiple_min, self.multiple_max
            )));
        }
        if self.tabs.is_empty() {
            return Err(CoreError::InvalidSettings(
                "at least one tab must be enabled".to_string(),
            ));
        }
        if self.secure_signature.is_some() != self.secure_expire.is_some() {
            return Err(CoreError::InvalidSettings(
                "secure_signature and secure_expire must be set together".to_string(),
            ));
        }
        if !self.cdn_base.starts_with("https://") && !self.cdn_base.starts_with("http://") {
            return Err(CoreError::InvalidSettings(format!(
                "cdn_base must be an http(s) URL: {}",
                self.cdn_base
            )));
        }
        Ok(())
    }

    pub fn crop_enabled(&self) -> bool {
        !self.crop.is_empty()
    }

    pub fn first_tab(&self) -> Option<&str> {
        self.tabs.first().map(String::as_str)
    }

    pub fn has_tab(&self, tab: &str) -> bool {
        self.tabs.iter().any(|t| t == tab)
    }

    /// Value for the `accept` attribute of the native file input
    pub fn input_accept_types(&self) -> String {
        match self.input_accept_types {
            Some(ref types) => types.clone(),
            None if self.images_only => "image/*".to_string(),
            None => String::new(),
        }
    }

    /// URL used to display a preview of `info`
    pub fn preview_url(&self, original_url: &str, info: &FileInfo) -> String {
        if let Some(ref callback) = self.preview_url_callback {
            return callback(original_url, info);
        }
        match self.preview_proxy {
            Some(ref proxy) => format!(
                "{}{}",
                proxy,
                utf8_percent_encode(original_url, NON_ALPHANUMERIC)
            ),
            None => original_url.to_string(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("cdn_base", &self.cdn_base)
            .field("captions", &self.captions)
            .field("clearable", &self.clearable)
            .field("crop", &self.crop)
            .field("images_only", &self.images_only)
            .field("multiple", &self.multiple)
            .field("multiple_min", &self.multiple_min)
            .field("multiple_max", &self.multiple_max)
            .field("preview_step", &self.preview_step)
            .field("tabs", &self.tabs)
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}
