use tracing::debug;

use crate::error::{RasterError, Result};
use crate::filters::{apply_chain, Adjustment};
use crate::raster::{rotate_about_center, Raster, CHANNELS};
use crate::transform::params::TransformParams;
use crate::transform::text::draw_text_centered;

/// Run the full transform over `source`.
///
/// Stages run in a fixed order, each on the previous stage's output:
/// 1. copy onto a canvas of the source size
/// 2. rotation about the centre (bilinear, transparent outside the source)
/// 3. brightness → contrast (around mid-gray) → saturation → catalog filter
/// 4. text overlay, painted last and untouched by the earlier stages
///
/// Identity parameters return a byte-identical copy of the input.
pub fn transform(source: &Raster, params: &TransformParams) -> Result<Raster> {
    validate(source)?;
    let params = params.normalized();

    let mut canvas = source.clone();

    if params.rotation != 0.0 {
        canvas = rotate_about_center(&canvas, params.rotation as f64);
    }

    let mut chain = vec![
        Adjustment::Brightness(params.brightness),
        Adjustment::Contrast(params.contrast),
        Adjustment::Saturate(params.saturation),
    ];
    chain.extend(params.filter.adjustments());
    canvas = apply_chain(canvas, &chain);

    if let Some(overlay) = &params.overlay {
        draw_text_centered(&mut canvas, overlay)?;
    }

    debug!(
        "Transformed {}x{} raster (rotation {:.1}, filter {})",
        canvas.width(),
        canvas.height(),
        params.rotation,
        params.filter.name()
    );
    Ok(canvas)
}

fn validate(source: &Raster) -> Result<()> {
    let (width, height) = source.dimensions();
    let expected = width as usize * height as usize * CHANNELS;

    if width == 0 || height == 0 || source.as_raw().len() != expected {
        return Err(RasterError::InvalidRaster {
            width,
            height,
            reason: format!(
                "storage holds {} bytes, expected {}",
                source.as_raw().len(),
                expected
            ),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterKind;
    use crate::raster::Rgb;
    use crate::transform::params::TextOverlay;

    fn photo(width: u32, height: u32) -> Raster {
        let mut data = Vec::with_capacity((width * height) as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = ((x + y) * 7 % 256) as u8;
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Raster::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_identity_is_byte_identical() {
        let source = photo(17, 9);
        let output = transform(&source, &TransformParams::identity()).unwrap();
        assert_eq!(output.as_raw(), source.as_raw());
    }

    #[test]
    fn test_transform_is_deterministic() {
        let source = photo(12, 12);
        let params = TransformParams::from_percent(120.0, 80.0, 140.0)
            .with_rotation(33.0)
            .with_filter(FilterKind::Vintage)
            .with_overlay(TextOverlay::new("Hi", Rgb::new(250, 10, 10), 8));

        let a = transform(&source, &params).unwrap();
        let b = transform(&source, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_brighter_mid_gray_keeps_hue() {
        let source = Raster::new_filled(6, 6, [128, 128, 128, 255]).unwrap();
        let params = TransformParams::from_percent(150.0, 100.0, 100.0);
        let output = transform(&source, &params).unwrap();

        for px in output.as_raw().chunks(CHANNELS) {
            assert_eq!(px, &[192, 192, 192, 255]);
        }
    }

    #[test]
    fn test_filter_does_not_change_geometry() {
        let source = photo(16, 10);
        let rotated = TransformParams::identity().with_rotation(30.0);

        let plain = transform(&source, &rotated).unwrap();
        let filtered = transform(&source, &rotated.clone().with_filter(FilterKind::Invert)).unwrap();

        // Coverage (alpha) comes from rotation alone
        let alpha = |r: &Raster| r.as_raw().chunks(CHANNELS).map(|px| px[3]).collect::<Vec<_>>();
        assert_eq!(alpha(&plain), alpha(&filtered));
    }

    #[test]
    fn test_rotation_does_not_change_color_stage() {
        let source = Raster::new_filled(10, 10, [90, 140, 200, 255]).unwrap();
        let colored = TransformParams::identity().with_filter(FilterKind::Sepia);

        let upright = transform(&source, &colored).unwrap();
        let turned = transform(&source, &colored.clone().with_rotation(90.0)).unwrap();

        // A flat opaque square rotated by 90 degrees covers itself exactly
        assert_eq!(upright.pixel(5, 5), turned.pixel(5, 5));
    }

    #[test]
    fn test_overlay_is_not_filtered() {
        let source = Raster::new_filled(40, 20, [10, 10, 10, 255]).unwrap();
        let params = TransformParams::identity()
            .with_filter(FilterKind::Invert)
            .with_overlay(TextOverlay::new("I", Rgb::new(0, 200, 0), 18));

        let output = transform(&source, &params).unwrap();
        // Background inverted; an inverted glyph would be magenta, not green
        assert_eq!(output.pixel(0, 0), [245, 245, 245, 255]);
        assert!(output
            .as_raw()
            .chunks(CHANNELS)
            .any(|px| px[0] == px[2] && px[1] as i32 - px[0] as i32 > 150));
    }
}
