use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static IMAGE_SHRINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)x([0-9]+)(?:\s+([0-9]{1,3})%)?$").expect("image shrink regex")
});

/// Largest area the client-side shrink accepts, in pixels
pub const MAX_SHRINK_AREA: u64 = 268 * 1_000_000;

/// Client-side image downsizing applied before upload (`"WxH"` or `"WxH Q%"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShrink {
    pub width: u32,
    pub height: u32,
    pub quality: Option<u8>,
}

impl ImageShrink {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let normalized = value.trim().to_lowercase();
        let caps = IMAGE_SHRINK
            .captures(&normalized)
            .ok_or_else(|| CoreError::InvalidImageShrink(value.to_string()))?;

        let width = caps[1]
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidImageShrink(value.to_string()))?;
        let height = caps[2]
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidImageShrink(value.to_string()))?;
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidImageShrink(format!(
                "dimensions must be positive: {}",
                value
            )));
        }
        if u64::from(width) * u64::from(height) > MAX_SHRINK_AREA {
            return Err(CoreError::InvalidImageShrink(format!(
                "area exceeds {} pixels: {}",
                MAX_SHRINK_AREA, value
            )));
        }

        let quality = match caps.get(3) {
            Some(q) => {
                let q = q
                    .as_str()
                    .parse::<u8>()
                    .map_err(|_| CoreError::InvalidImageShrink(value.to_string()))?;
                if q == 0 || q > 100 {
                    return Err(CoreError::InvalidImageShrink(format!(
                        "quality must be between 1 and 100: {}",
                        value
                    )));
                }
                Some(q)
            }
            None => None,
        };

        Ok(Self {
            width,
            height,
            quality,
        })
    }
}

impl fmt::Display for ImageShrink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if let Some(quality) = self.quality {
            write!(f, " {}%", quality)?;
        }
        Ok(())
    }
}
