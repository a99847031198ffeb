use serde::{Deserialize, Serialize};

use crate::filters::color::Adjustment;

/// Blur radius used by the catalog's blur entry (gaussian sigma, pixels)
pub const BLUR_SIGMA: f32 = 2.0;

/// The fixed filter catalog.
///
/// Every entry expands to a fixed chain of primitive [`Adjustment`]s; the
/// composite presets are nothing more than longer chains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    #[default]
    Identity,
    Sepia,
    Grayscale,
    Blur,
    HueRotate { degrees: f32 },
    Invert,
    Vintage,
    Cool,
    Warm,
}

impl FilterKind {
    /// Canonical catalog name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Sepia => "sepia",
            Self::Grayscale => "grayscale",
            Self::Blur => "blur",
            Self::HueRotate { .. } => "hue-rotate",
            Self::Invert => "invert",
            Self::Vintage => "vintage",
            Self::Cool => "cool",
            Self::Warm => "warm",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "No filter",
            Self::Sepia => "Full sepia tone",
            Self::Grayscale => "Luma grayscale",
            Self::Blur => "Gaussian soften",
            Self::HueRotate { .. } => "Rotate hues around the colour wheel",
            Self::Invert => "Photographic negative",
            Self::Vintage => "Half sepia with lifted contrast and dimmed exposure",
            Self::Cool => "Blue-shifted, slightly desaturated",
            Self::Warm => "Light sepia with boosted saturation",
        }
    }

    /// The primitive chain this filter applies, in order
    pub fn adjustments(&self) -> Vec<Adjustment> {
        match *self {
            Self::Identity => vec![],
            Self::Sepia => vec![Adjustment::Sepia(1.0)],
            Self::Grayscale => vec![Adjustment::Grayscale(1.0)],
            Self::Blur => vec![Adjustment::Blur(BLUR_SIGMA)],
            Self::HueRotate { degrees } => vec![Adjustment::HueRotate(degrees)],
            Self::Invert => vec![Adjustment::Invert(1.0)],
            Self::Vintage => vec![
                Adjustment::Sepia(0.5),
                Adjustment::Contrast(1.2),
                Adjustment::Brightness(0.9),
            ],
            Self::Cool => vec![
                Adjustment::Saturate(0.9),
                Adjustment::HueRotate(180.0),
                Adjustment::Brightness(1.05),
            ],
            Self::Warm => vec![Adjustment::Sepia(0.3), Adjustment::Saturate(1.4)],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.adjustments().iter().all(Adjustment::is_identity)
    }

    /// Hashable identity of the filter, including its argument
    pub(crate) fn key(&self) -> (u8, u32) {
        match *self {
            Self::Identity => (0, 0),
            Self::Sepia => (1, 0),
            Self::Grayscale => (2, 0),
            Self::Blur => (3, 0),
            Self::HueRotate { degrees } => (4, degrees.to_bits()),
            Self::Invert => (5, 0),
            Self::Vintage => (6, 0),
            Self::Cool => (7, 0),
            Self::Warm => (8, 0),
        }
    }
}
