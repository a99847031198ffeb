use serde::{Deserialize, Serialize};

use crate::filters::FilterKind;
use crate::raster::Rgb;

/// Lower bound of the brightness/contrast/saturation factors
pub const MIN_FACTOR: f32 = 0.0;
/// Upper bound of the brightness/contrast/saturation factors
pub const MAX_FACTOR: f32 = 2.0;
/// Rotation range in degrees, symmetric around zero
pub const MAX_ROTATION: f32 = 180.0;

/// Text painted on top of the transformed raster, centred on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    pub color: Rgb,
    /// Font size in pixels per em
    pub size: u32,
}

impl TextOverlay {
    pub fn new<S: Into<String>>(text: S, color: Rgb, size: u32) -> Self {
        Self {
            text: text.into(),
            color,
            size: size.max(1),
        }
    }
}

/// Every adjustment applied to one raster.
///
/// A pure value: the same parameters applied to the same raster always
/// produce the same pixels. Out-of-range values are clamped when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Multiplicative factor in [0, 2], 1.0 is identity
    pub brightness: f32,
    /// Multiplicative factor around mid-gray in [0, 2], 1.0 is identity
    pub contrast: f32,
    /// Luma-preserving factor in [0, 2], 1.0 is identity
    pub saturation: f32,
    /// Degrees in [-180, 180], positive is clockwise
    pub rotation: f32,
    pub filter: FilterKind,
    pub overlay: Option<TextOverlay>,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformParams {
    /// Parameters that leave a raster untouched
    pub fn identity() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            rotation: 0.0,
            filter: FilterKind::Identity,
            overlay: None,
        }
    }

    /// Build from percentages where 100 is identity (150 = factor 1.5)
    pub fn from_percent(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self::identity()
            .with_brightness(brightness / 100.0)
            .with_contrast(contrast / 100.0)
            .with_saturation(saturation / 100.0)
    }

    pub fn with_brightness(mut self, factor: f32) -> Self {
        self.brightness = clamp_factor(factor);
        self
    }

    pub fn with_contrast(mut self, factor: f32) -> Self {
        self.contrast = clamp_factor(factor);
        self
    }

    pub fn with_saturation(mut self, factor: f32) -> Self {
        self.saturation = clamp_factor(factor);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = clamp_rotation(degrees);
        self
    }

    pub fn with_filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_overlay(mut self, overlay: TextOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Copy with every numeric field forced into its valid range
    pub fn normalized(&self) -> Self {
        Self {
            brightness: clamp_factor(self.brightness),
            contrast: clamp_factor(self.contrast),
            saturation: clamp_factor(self.saturation),
            rotation: clamp_rotation(self.rotation),
            filter: self.filter,
            overlay: self.overlay.clone().map(|o| TextOverlay::new(o.text, o.color, o.size)),
        }
    }

    pub fn is_identity(&self) -> bool {
        let p = self.normalized();
        p.brightness == 1.0
            && p.contrast == 1.0
            && p.saturation == 1.0
            && p.rotation == 0.0
            && p.filter.is_identity()
            && p.overlay.is_none()
    }

    /// Hashable fingerprint of every field that affects pixel output
    pub fn key(&self) -> ParamsKey {
        let p = self.normalized();
        ParamsKey {
            brightness: p.brightness.to_bits(),
            contrast: p.contrast.to_bits(),
            saturation: p.saturation.to_bits(),
            rotation: p.rotation.to_bits(),
            filter: p.filter.key(),
            overlay: p.overlay.map(|o| (o.text, o.color.0, o.size)),
        }
    }
}

/// Cache key form of [`TransformParams`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamsKey {
    brightness: u32,
    contrast: u32,
    saturation: u32,
    rotation: u32,
    filter: (u8, u32),
    overlay: Option<(String, [u8; 3], u32)>,
}

fn clamp_factor(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_FACTOR, MAX_FACTOR)
    } else {
        1.0
    }
}

fn clamp_rotation(value: f32) -> f32 {
    if value.is_finite() {
        // -0.0 and 0.0 must share a cache key
        value.clamp(-MAX_ROTATION, MAX_ROTATION) + 0.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_percent() {
        let params = TransformParams::from_percent(150.0, 100.0, 100.0);
        assert_eq!(params.brightness, 1.5);
        assert_eq!(params.contrast, 1.0);
        assert_eq!(params.saturation, 1.0);
    }

    #[test]
    fn test_values_are_clamped() {
        let params = TransformParams::identity()
            .with_brightness(5.0)
            .with_contrast(-1.0)
            .with_saturation(f32::NAN)
            .with_rotation(270.0);
        assert_eq!(params.brightness, 2.0);
        assert_eq!(params.contrast, 0.0);
        assert_eq!(params.saturation, 1.0);
        assert_eq!(params.rotation, 180.0);
    }

    #[test]
    fn test_key_covers_overlay() {
        let base = TransformParams::identity();
        let with_text = base.clone().with_overlay(TextOverlay::new("HI", Rgb::WHITE, 24));
        let other_color = base.clone().with_overlay(TextOverlay::new("HI", Rgb::BLACK, 24));
        let other_size = base.clone().with_overlay(TextOverlay::new("HI", Rgb::WHITE, 25));

        assert_ne!(base.key(), with_text.key());
        assert_ne!(with_text.key(), other_color.key());
        assert_ne!(with_text.key(), other_size.key());
        assert_eq!(with_text.key(), with_text.clone().key());
    }

    #[test]
    fn test_identity_detection() {
        assert!(TransformParams::identity().is_identity());
        assert!(!TransformParams::identity().with_rotation(1.0).is_identity());
        assert!(!TransformParams::identity()
            .with_filter(FilterKind::Sepia)
            .is_identity());
    }
}
