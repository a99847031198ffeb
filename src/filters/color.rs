use image::imageops;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::raster::geometry::to_channel;
use crate::raster::{Raster, CHANNELS};

/// Luma weights shared by the saturation, grayscale and hue matrices
const LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Midpoint contrast pivots around
pub const MID_GRAY: f64 = 128.0;

/// One primitive raster adjustment.
///
/// All variants except [`Adjustment::Blur`] act on a single pixel's RGB and
/// leave alpha untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adjustment {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    Sepia(f32),
    Grayscale(f32),
    HueRotate(f32),
    Invert(f32),
    Blur(f32),
}

impl Adjustment {
    /// Whether applying this adjustment leaves every pixel unchanged
    pub fn is_identity(&self) -> bool {
        match *self {
            Self::Brightness(k) | Self::Contrast(k) | Self::Saturate(k) => k == 1.0,
            Self::Sepia(a) | Self::Grayscale(a) | Self::Invert(a) => a == 0.0,
            Self::HueRotate(deg) => deg % 360.0 == 0.0,
            Self::Blur(sigma) => sigma <= 0.0,
        }
    }

    fn is_spatial(&self) -> bool {
        matches!(self, Self::Blur(_))
    }

    /// Apply a per-pixel adjustment to an RGB triple in 0..=255 space
    fn apply_rgb(&self, rgb: [f64; 3]) -> [f64; 3] {
        let out = match *self {
            Self::Brightness(k) => rgb.map(|c| c * k as f64),
            Self::Contrast(k) => rgb.map(|c| (c - MID_GRAY) * k as f64 + MID_GRAY),
            Self::Saturate(s) => multiply(&saturate_matrix(s as f64), rgb),
            Self::Grayscale(a) => multiply(&saturate_matrix(1.0 - a.clamp(0.0, 1.0) as f64), rgb),
            Self::Sepia(a) => multiply(&sepia_matrix(a.clamp(0.0, 1.0) as f64), rgb),
            Self::HueRotate(deg) => multiply(&hue_rotate_matrix(deg as f64), rgb),
            Self::Invert(a) => {
                let a = a.clamp(0.0, 1.0) as f64;
                rgb.map(|c| c * (1.0 - a) + (255.0 - c) * a)
            }
            Self::Blur(_) => rgb,
        };
        out.map(|c| c.clamp(0.0, 255.0))
    }
}

type Matrix = [[f64; 3]; 3];

fn multiply(m: &Matrix, rgb: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
        m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
        m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
    ]
}

/// Luma-preserving saturation; `s = 0` is grayscale, `s = 1` identity
fn saturate_matrix(s: f64) -> Matrix {
    let [r, g, b] = LUMA;
    [
        [r + (1.0 - r) * s, g - g * s, b - b * s],
        [r - r * s, g + (1.0 - g) * s, b - b * s],
        [r - r * s, g - g * s, b + (1.0 - b) * s],
    ]
}

fn sepia_matrix(amount: f64) -> Matrix {
    let g = 1.0 - amount;
    [
        [0.393 + 0.607 * g, 0.769 - 0.769 * g, 0.189 - 0.189 * g],
        [0.349 - 0.349 * g, 0.686 + 0.314 * g, 0.168 - 0.168 * g],
        [0.272 - 0.272 * g, 0.534 - 0.534 * g, 0.131 + 0.869 * g],
    ]
}

fn hue_rotate_matrix(degrees: f64) -> Matrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Apply `chain` in order to `raster`.
///
/// Runs of per-pixel adjustments are fused into one pass: each stage sees the
/// previous stage's (clamped) output and rounding to bytes happens once at
/// the end of the run. Identity stages are skipped, so an all-identity chain
/// returns the input unchanged.
pub fn apply_chain(mut raster: Raster, chain: &[Adjustment]) -> Raster {
    let active: Vec<Adjustment> = chain.iter().copied().filter(|adj| !adj.is_identity()).collect();

    let mut run: Vec<Adjustment> = Vec::new();
    for adjustment in active {
        if adjustment.is_spatial() {
            apply_pixel_run(&mut raster, &run);
            run.clear();
            raster = apply_spatial(raster, adjustment);
        } else {
            run.push(adjustment);
        }
    }
    apply_pixel_run(&mut raster, &run);
    raster
}

fn apply_pixel_run(raster: &mut Raster, run: &[Adjustment]) {
    if run.is_empty() {
        return;
    }

    raster.as_raw_mut().par_chunks_mut(CHANNELS).for_each(|px| {
        let mut rgb = [px[0] as f64, px[1] as f64, px[2] as f64];
        for adjustment in run {
            rgb = adjustment.apply_rgb(rgb);
        }
        px[0] = to_channel(rgb[0]);
        px[1] = to_channel(rgb[1]);
        px[2] = to_channel(rgb[2]);
    });
}

fn apply_spatial(raster: Raster, adjustment: Adjustment) -> Raster {
    match adjustment {
        Adjustment::Blur(sigma) => {
            let blurred = imageops::blur(raster.as_image(), sigma);
            Raster::from_image(blurred).unwrap_or(raster)
        }
        _ => raster,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(rgb: [u8; 3]) -> Raster {
        Raster::new_filled(3, 3, [rgb[0], rgb[1], rgb[2], 255]).unwrap()
    }

    #[test]
    fn test_identity_chain_is_byte_identical() {
        let raster = flat([12, 200, 77]);
        let chain = [
            Adjustment::Brightness(1.0),
            Adjustment::Contrast(1.0),
            Adjustment::Saturate(1.0),
            Adjustment::HueRotate(360.0),
            Adjustment::Blur(0.0),
        ];
        assert_eq!(apply_chain(raster.clone(), &chain), raster);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let out = apply_chain(flat([128, 128, 128]), &[Adjustment::Brightness(1.5)]);
        assert_eq!(out.pixel(1, 1), [192, 192, 192, 255]);
    }

    #[test]
    fn test_contrast_pivots_on_mid_gray() {
        let out = apply_chain(flat([128, 100, 200]), &[Adjustment::Contrast(2.0)]);
        assert_eq!(out.pixel(0, 0), [128, 72, 255, 255]);
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let out = apply_chain(flat([255, 0, 0]), &[Adjustment::Saturate(0.0)]);
        let [r, g, b, _] = out.pixel(0, 0);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54); // 0.2126 * 255
    }

    #[test]
    fn test_invert_preserves_alpha() {
        let raster = Raster::new_filled(2, 2, [10, 20, 30, 99]).unwrap();
        let out = apply_chain(raster, &[Adjustment::Invert(1.0)]);
        assert_eq!(out.pixel(1, 0), [245, 235, 225, 99]);
    }

    #[test]
    fn test_sepia_on_white_is_warm() {
        let out = apply_chain(flat([255, 255, 255]), &[Adjustment::Sepia(1.0)]);
        let [r, g, b, _] = out.pixel(0, 0);
        assert!(r >= g && g > b);
    }

    #[test]
    fn test_order_matters() {
        let source = flat([200, 60, 20]);
        let a = apply_chain(
            source.clone(),
            &[Adjustment::Contrast(1.8), Adjustment::Grayscale(1.0)],
        );
        let b = apply_chain(source, &[Adjustment::Grayscale(1.0), Adjustment::Contrast(1.8)]);
        assert_ne!(a, b);
    }
}
