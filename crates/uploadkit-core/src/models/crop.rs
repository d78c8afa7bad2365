use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static CROP_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)([x:])([0-9]+)\s*(|upscale|minimum)$").expect("crop spec regex")
});

/// One crop policy
///
/// `preferred_size` is `None` for a free crop. With `downscale` the selection
/// is resized down to the preferred size; with only a ratio (`W:H`) the
/// preferred size just fixes the aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CropSettings {
    pub downscale: bool,
    pub upscale: bool,
    pub not_less: bool,
    pub preferred_size: Option<(u32, u32)>,
}

impl CropSettings {
    pub fn free() -> Self {
        Self::default()
    }

    /// Fixed output size; the selection is downscaled to it
    pub fn fixed_size(width: u32, height: u32) -> Self {
        Self {
            downscale: true,
            upscale: false,
            not_less: false,
            preferred_size: Some((width, height)),
        }
    }

    /// Fixed aspect ratio without resizing
    pub fn ratio(width: u32, height: u32) -> Self {
        Self {
            downscale: false,
            upscale: false,
            not_less: false,
            preferred_size: Some((width, height)),
        }
    }

    /// Parse one crop spec: `free`, `W:H`, `WxH`, `WxH upscale` or `WxH minimum`.
    pub fn parse(spec: &str) -> Result<Self, CoreError> {
        let normalized = spec.trim().to_lowercase();
        if normalized.is_empty() || normalized == "free" {
            return Ok(Self::free());
        }

        let caps = CROP_SPEC
            .captures(&normalized)
            .ok_or_else(|| CoreError::InvalidCropSpec(spec.to_string()))?;

        let width = caps[1]
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidCropSpec(spec.to_string()))?;
        let height = caps[3]
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidCropSpec(spec.to_string()))?;
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidCropSpec(format!(
                "crop size must be positive: {}",
                spec
            )));
        }

        let modifier = &caps[4];
        Ok(Self {
            downscale: &caps[2] == "x",
            upscale: !modifier.is_empty(),
            not_less: modifier == "minimum",
            preferred_size: Some((width, height)),
        })
    }

    pub fn is_free(&self) -> bool {
        self.preferred_size.is_none()
    }

    /// Width divided by height of the preferred size
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.preferred_size
            .map(|(width, height)| width as f64 / height as f64)
    }
}

/// The `crop` dialog option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropMode {
    Disabled,
    Free,
    /// Comma-separated list of crop specs, e.g. `"16:9, 4:3"` or `"300x200 upscale"`
    Custom(String),
}

impl CropMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "disabled" | "false" | "none" => Self::Disabled,
            "" | "free" => Self::Free,
            _ => Self::Custom(value.trim().to_string()),
        }
    }

    /// Resolve into crop policies; an empty list means cropping is disabled
    pub fn settings(&self) -> Result<Vec<CropSettings>, CoreError> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Free => Ok(vec![CropSettings::free()]),
            Self::Custom(specs) => specs.split(',').map(CropSettings::parse).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_free() {
        assert_eq!(CropSettings::parse("free").unwrap(), CropSettings::free());
        assert_eq!(CropSettings::parse("  ").unwrap(), CropSettings::free());
        assert!(CropSettings::free().is_free());
    }

    #[test]
    fn test_parse_ratio() {
        let crop = CropSettings::parse("16:9").unwrap();
        assert!(!crop.downscale);
        assert!(!crop.upscale);
        assert_eq!(crop.preferred_size, Some((16, 9)));
        assert!((crop.aspect_ratio().unwrap() - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_size_with_modifiers() {
        let crop = CropSettings::parse("300x200").unwrap();
        assert_eq!(crop, CropSettings::fixed_size(300, 200));

        let crop = CropSettings::parse("300x200 upscale").unwrap();
        assert!(crop.downscale && crop.upscale && !crop.not_less);

        let crop = CropSettings::parse("300X200 Minimum").unwrap();
        assert!(crop.downscale && crop.upscale && crop.not_less);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(CropSettings::parse("wide").is_err());
        assert!(CropSettings::parse("300x").is_err());
        assert!(CropSettings::parse("0x200").is_err());
        assert!(CropSettings::parse("300x200 sideways").is_err());
    }

    #[test]
    fn test_crop_mode_settings() {
        assert!(CropMode::parse("disabled").settings().unwrap().is_empty());
        assert_eq!(
            CropMode::parse("free").settings().unwrap(),
            vec![CropSettings::free()]
        );

        let list = CropMode::parse("16:9, 300x200 minimum").settings().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].preferred_size, Some((16, 9)));
        assert!(list[1].not_less);

        assert!(CropMode::parse("16:9, nope").settings().is_err());
    }
}
