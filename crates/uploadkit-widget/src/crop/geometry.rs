//! Crop selection geometry and modifier encoding
//!
//! All coordinates are in pixels of the original image.

use uploadkit_core::transform_url::{parse_dimensions, parse_point};
use uploadkit_core::{build_modifiers, parse_modifiers, CropSettings, ModifierOp};

use crate::error::WidgetError;

/// A crop area inside an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The whole image
    pub fn full((width, height): (u32, u32)) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn ratio_height(width: u32, ratio: f64) -> u32 {
    ((width as f64 / ratio).round() as u32).max(1)
}

fn ratio_width(height: u32, ratio: f64) -> u32 {
    ((height as f64 * ratio).round() as u32).max(1)
}

/// Largest centred area matching the preferred ratio, or the whole image
/// for free crops
pub fn default_selection(image: (u32, u32), settings: &CropSettings) -> CropRect {
    let (image_width, image_height) = image;
    let ratio = match settings.aspect_ratio() {
        Some(ratio) => ratio,
        None => return CropRect::full(image),
    };

    let (width, height) = if (image_width as f64 / image_height as f64) > ratio {
        (ratio_width(image_height, ratio).min(image_width), image_height)
    } else {
        (image_width, ratio_height(image_width, ratio).min(image_height))
    };

    CropRect::new(
        (image_width - width) / 2,
        (image_height - height) / 2,
        width,
        height,
    )
}

/// Fit `rect` into the image and the crop constraints.
///
/// The result is a fixed point: constraining it again returns it unchanged.
pub fn constrain(rect: CropRect, image: (u32, u32), settings: &CropSettings) -> CropRect {
    let (image_width, image_height) = image;
    let mut width = rect.width.clamp(1, image_width);
    let mut height = rect.height.clamp(1, image_height);

    if let (Some((preferred_width, preferred_height)), Some(ratio)) =
        (settings.preferred_size, settings.aspect_ratio())
    {
        if settings.not_less {
            width = width.max(preferred_width.min(image_width));
            height = height.max(preferred_height.min(image_height));
        }

        let matches_ratio =
            height == ratio_height(width, ratio) || width == ratio_width(height, ratio);
        if !matches_ratio {
            height = ratio_height(width, ratio);
            if height > image_height {
                height = image_height;
                width = ratio_width(height, ratio).min(image_width);
            }
        }
    }

    CropRect::new(
        rect.left.min(image_width - width),
        rect.top.min(image_height - height),
        width,
        height,
    )
}

/// Modifier operations that apply `rect` under `settings`
pub fn selection_ops(rect: CropRect, image: (u32, u32), settings: &CropSettings) -> Vec<ModifierOp> {
    let mut ops = Vec::new();
    if rect != CropRect::full(image) {
        ops.push(ModifierOp::new(
            "crop",
            [
                format!("{}x{}", rect.width, rect.height),
                format!("{},{}", rect.left, rect.top),
            ],
        ));
    }

    if let Some((preferred_width, preferred_height)) = settings.preferred_size {
        let larger = rect.width > preferred_width || rect.height > preferred_height;
        let smaller = rect.width < preferred_width || rect.height < preferred_height;
        if (settings.downscale && larger) || (settings.upscale && smaller) {
            ops.push(ModifierOp::new(
                "resize",
                [format!("{}x{}", preferred_width, preferred_height)],
            ));
        }
    }
    ops
}

/// Modifier string for `rect`, `None` when nothing needs to change
pub fn selection_modifiers(
    rect: CropRect,
    image: (u32, u32),
    settings: &CropSettings,
) -> Option<String> {
    let ops = selection_ops(rect, image, settings);
    if ops.is_empty() {
        None
    } else {
        Some(build_modifiers(&ops))
    }
}

/// Crop area encoded in a modifier string.
///
/// Returns `Ok(None)` when the string carries no crop operation. Other
/// operations are ignored.
pub fn parse_selection(modifiers: &str, image: (u32, u32)) -> Result<Option<CropRect>, WidgetError> {
    let invalid = |err: uploadkit_core::CoreError| WidgetError::InvalidModifiers(err.to_string());
    let ops = parse_modifiers(modifiers).map_err(invalid)?;

    let crop = match ops.iter().rev().find(|op| op.name == "crop") {
        Some(op) => op,
        None => return Ok(None),
    };

    let size = crop.args.first().ok_or_else(|| {
        WidgetError::InvalidModifiers(format!("crop without size: {}", modifiers))
    })?;
    let (width, height) = parse_dimensions(size).map_err(invalid)?;
    if width == 0 || height == 0 {
        return Err(WidgetError::InvalidModifiers(format!(
            "empty crop area: {}",
            size
        )));
    }

    let (left, top) = match crop.args.get(1).map(String::as_str) {
        Some("center") => (
            image.0.saturating_sub(width) / 2,
            image.1.saturating_sub(height) / 2,
        ),
        Some(point) => parse_point(point).map_err(invalid)?,
        None => (0, 0),
    };

    Ok(Some(CropRect::new(left, top, width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: (u32, u32) = (800, 600);

    #[test]
    fn test_default_selection_free() {
        assert_eq!(
            default_selection(IMAGE, &CropSettings::free()),
            CropRect::full(IMAGE)
        );
    }

    #[test]
    fn test_default_selection_ratio() {
        let square = default_selection(IMAGE, &CropSettings::ratio(1, 1));
        assert_eq!(square, CropRect::new(100, 0, 600, 600));

        let wide = default_selection(IMAGE, &CropSettings::ratio(16, 4));
        assert_eq!(wide, CropRect::new(0, 200, 800, 200));
    }

    #[test]
    fn test_constrain_clamps_into_image() {
        let rect = constrain(
            CropRect::new(700, 550, 300, 300),
            IMAGE,
            &CropSettings::free(),
        );
        assert_eq!(rect, CropRect::new(500, 300, 300, 300));
    }

    #[test]
    fn test_constrain_forces_ratio() {
        let rect = constrain(
            CropRect::new(0, 0, 400, 100),
            IMAGE,
            &CropSettings::ratio(2, 1),
        );
        assert_eq!(rect.size(), (400, 200));
    }

    #[test]
    fn test_constrain_not_less() {
        let settings = CropSettings::parse("300x200 minimum").unwrap();
        let rect = constrain(CropRect::new(10, 10, 30, 20), IMAGE, &settings);
        assert_eq!(rect.size(), (300, 200));
    }

    #[test]
    fn test_constrain_is_a_fixed_point() {
        let settings = CropSettings::ratio(3, 7);
        for rect in [
            CropRect::new(5, 5, 101, 33),
            CropRect::new(0, 0, 800, 600),
            CropRect::new(700, 10, 17, 590),
        ] {
            let once = constrain(rect, IMAGE, &settings);
            assert_eq!(constrain(once, IMAGE, &settings), once);
        }
    }

    #[test]
    fn test_selection_modifiers() {
        let settings = CropSettings::fixed_size(200, 100);
        let rect = CropRect::new(10, 20, 400, 200);
        assert_eq!(
            selection_modifiers(rect, IMAGE, &settings).as_deref(),
            Some("-/crop/400x200/10,20/-/resize/200x100/")
        );

        assert_eq!(
            selection_modifiers(CropRect::full(IMAGE), IMAGE, &CropSettings::free()),
            None
        );
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            parse_selection("-/crop/400x200/10,20/-/resize/200x100/", IMAGE).unwrap(),
            Some(CropRect::new(10, 20, 400, 200))
        );
        assert_eq!(
            parse_selection("-/crop/200x200/center/", IMAGE).unwrap(),
            Some(CropRect::new(300, 200, 200, 200))
        );
        assert_eq!(parse_selection("-/grayscale/", IMAGE).unwrap(), None);
        assert!(matches!(
            parse_selection("-/crop/axb/0,0/", IMAGE),
            Err(WidgetError::InvalidModifiers(_))
        ));
    }
}
