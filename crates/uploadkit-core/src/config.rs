//! Configuration module
//!
//! Widget-wide defaults loaded from the environment. Per-dialog values come
//! from `DialogOptions` and are merged over these in `Settings::resolve`.

use std::env;

use crate::models::{
    Settings, DEFAULT_CDN_BASE, DEFAULT_MULTIPART_MIN_SIZE, DEFAULT_MULTIPLE_MAX,
    DEFAULT_MULTIPLE_MIN, DEFAULT_TABS,
};

/// Widget configuration
#[derive(Clone, Debug)]
pub struct WidgetConfig {
    pub public_key: Option<String>,
    pub cdn_base: String,
    pub tabs: Vec<String>,
    pub multipart_min_size: u64,
    pub multiple_min: u32,
    pub multiple_max: u32,
    pub images_only: bool,
    pub do_not_store: bool,
    pub preview_step: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            tabs: DEFAULT_TABS.iter().map(|t| t.to_string()).collect(),
            multipart_min_size: DEFAULT_MULTIPART_MIN_SIZE,
            multiple_min: DEFAULT_MULTIPLE_MIN,
            multiple_max: DEFAULT_MULTIPLE_MAX,
            images_only: false,
            do_not_store: false,
            preview_step: false,
        }
    }
}

impl WidgetConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let public_key = env::var("UPLOADKIT_PUBLIC_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let cdn_base = env::var("UPLOADKIT_CDN_BASE")
            .unwrap_or(defaults.cdn_base)
            .trim_end_matches('/')
            .to_string();

        let tabs = match env::var("UPLOADKIT_TABS") {
            Ok(value) => value.split_whitespace().map(str::to_string).collect(),
            Err(_) => defaults.tabs,
        };

        let multipart_min_size = env::var("UPLOADKIT_MULTIPART_MIN_SIZE")
            .unwrap_or_else(|_| DEFAULT_MULTIPART_MIN_SIZE.to_string())
            .parse::<u64>()
            .unwrap_or(DEFAULT_MULTIPART_MIN_SIZE);

        let multiple_min = env::var("UPLOADKIT_MULTIPLE_MIN")
            .unwrap_or_else(|_| DEFAULT_MULTIPLE_MIN.to_string())
            .parse::<u32>()
            .unwrap_or(DEFAULT_MULTIPLE_MIN);

        let multiple_max = env::var("UPLOADKIT_MULTIPLE_MAX")
            .unwrap_or_else(|_| DEFAULT_MULTIPLE_MAX.to_string())
            .parse::<u32>()
            .unwrap_or(DEFAULT_MULTIPLE_MAX);

        let config = Self {
            public_key,
            cdn_base,
            tabs,
            multipart_min_size,
            multiple_min,
            multiple_max,
            images_only: env_flag("UPLOADKIT_IMAGES_ONLY"),
            do_not_store: env_flag("UPLOADKIT_DO_NOT_STORE"),
            preview_step: env_flag("UPLOADKIT_PREVIEW_STEP"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.cdn_base.starts_with("https://") && !self.cdn_base.starts_with("http://") {
            return Err(anyhow::anyhow!(
                "UPLOADKIT_CDN_BASE must be an http(s) URL, got '{}'",
                self.cdn_base
            ));
        }
        if self.tabs.is_empty() {
            return Err(anyhow::anyhow!("UPLOADKIT_TABS must list at least one tab"));
        }
        if self.multiple_min == 0 || self.multiple_min > self.multiple_max {
            return Err(anyhow::anyhow!(
                "UPLOADKIT_MULTIPLE_MIN ({}) must be between 1 and UPLOADKIT_MULTIPLE_MAX ({})",
                self.multiple_min,
                self.multiple_max
            ));
        }
        if self.public_key.is_none() {
            tracing::warn!("UPLOADKIT_PUBLIC_KEY is not set; uploads will be rejected by most backends");
        }
        Ok(())
    }

    /// Base settings every dialog starts from
    pub fn into_settings(self) -> Settings {
        Settings {
            public_key: self.public_key,
            cdn_base: self.cdn_base,
            tabs: self.tabs,
            multipart_min_size: self.multipart_min_size,
            multiple_min: self.multiple_min,
            multiple_max: self.multiple_max,
            images_only: self.images_only,
            do_not_store: self.do_not_store,
            preview_step: self.preview_step,
            ..Settings::default()
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WidgetConfig::default();
        assert!(config.validate().is_ok());

        let settings = config.into_settings();
        assert_eq!(settings.cdn_base, DEFAULT_CDN_BASE);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WidgetConfig {
            cdn_base: "ucarecdn.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WidgetConfig {
            multiple_min: 10,
            multiple_max: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WidgetConfig {
            tabs: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
