// src/raster/geometry.rs - Resampling and compositing shared by pipeline and transitions

use image::imageops::{self, FilterType};
use rayon::prelude::*;

use crate::raster::types::{Raster, CHANNELS, TRANSPARENT};

/// Axis-aligned destination rectangle, may extend past the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// A `width` x `height` rectangle centred on a canvas of the given size
    pub fn centered(canvas_width: u32, canvas_height: u32, width: u32, height: u32) -> Self {
        Self {
            x: (canvas_width as i64 - width as i64) / 2,
            y: (canvas_height as i64 - height as i64) / 2,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rotate `source` about its centre by `degrees` (positive is clockwise on
/// screen), keeping the canvas size.
///
/// Sampling is bilinear in premultiplied alpha; samples that fall outside the
/// source are transparent, never wrapped.
pub fn rotate_about_center(source: &Raster, degrees: f64) -> Raster {
    if degrees % 360.0 == 0.0 {
        return source.clone();
    }

    let (width, height) = source.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let row_len = width as usize * CHANNELS;

    let mut out = vec![0u8; row_len * height as usize];
    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let dy = y as f64 + 0.5 - cy;
        for x in 0..width as usize {
            let dx = x as f64 + 0.5 - cx;
            // Inverse mapping: output pixel -> source position
            let sx = cos * dx + sin * dy + cx - 0.5;
            let sy = -sin * dx + cos * dy + cy - 0.5;
            let px = sample_bilinear(source, sx, sy);
            row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&px);
        }
    });

    Raster::from_rgba(width, height, out).unwrap_or_else(|_| source.clone())
}

fn sample_bilinear(source: &Raster, fx: f64, fy: f64) -> [u8; 4] {
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let taps = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x0 + 1, y0, tx * (1.0 - ty)),
        (x0, y0 + 1, (1.0 - tx) * ty),
        (x0 + 1, y0 + 1, tx * ty),
    ];

    let mut alpha = 0.0f64;
    let mut premul = [0.0f64; 3];
    for (x, y, weight) in taps {
        if weight == 0.0 {
            continue;
        }
        let px = pixel_or_transparent(source, x, y);
        let a = px[3] as f64 * weight;
        alpha += a;
        for c in 0..3 {
            premul[c] += px[c] as f64 * a;
        }
    }

    if alpha <= 0.0 {
        return TRANSPARENT;
    }
    [
        to_channel(premul[0] / alpha),
        to_channel(premul[1] / alpha),
        to_channel(premul[2] / alpha),
        to_channel(alpha),
    ]
}

fn pixel_or_transparent(source: &Raster, x: i64, y: i64) -> [u8; 4] {
    if x < 0 || y < 0 || x >= source.width() as i64 || y >= source.height() as i64 {
        TRANSPARENT
    } else {
        source.pixel(x as u32, y as u32)
    }
}

/// Round and clamp a channel value into a byte
pub(crate) fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Scale `source` into a `width` x `height` canvas preserving aspect ratio,
/// centred, with the shorter axis padded by `background`.
pub fn fit_to_canvas(source: &Raster, width: u32, height: u32, background: [u8; 4]) -> Raster {
    let (src_w, src_h) = source.dimensions();
    let scale = (width as f64 / src_w as f64).min(height as f64 / src_h as f64);
    let fit_w = ((src_w as f64 * scale).round() as u32).clamp(1, width);
    let fit_h = ((src_h as f64 * scale).round() as u32).clamp(1, height);

    let mut canvas = match Raster::new_filled(width, height, background) {
        Ok(canvas) => canvas,
        Err(_) => return source.clone(),
    };

    let rect = Rect::centered(width, height, fit_w, fit_h);
    if (fit_w, fit_h) == (src_w, src_h) {
        composite_over(&mut canvas, source, rect.x, rect.y, 1.0);
    } else {
        let resized = imageops::resize(source.as_image(), fit_w, fit_h, FilterType::Triangle);
        match Raster::from_image(resized) {
            Ok(resized) => composite_over(&mut canvas, &resized, rect.x, rect.y, 1.0),
            Err(_) => return canvas,
        }
    }
    canvas
}

/// Draw `source` over `dest` with its top-left corner at (`x`, `y`) using
/// source-over blending scaled by `opacity`.
pub fn composite_over(dest: &mut Raster, source: &Raster, x: i64, y: i64, opacity: f32) {
    let rect = Rect::new(x, y, source.width(), source.height());
    blit_scaled(dest, source, rect, opacity);
}

/// Draw `source` resampled (nearest neighbour) into `rect` of `dest`,
/// blending source-over with `opacity`. Parts of `rect` outside `dest` are
/// clipped.
pub fn blit_scaled(dest: &mut Raster, source: &Raster, rect: Rect, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0) as f64;
    if rect.is_empty() || opacity == 0.0 {
        return;
    }

    let (dest_w, dest_h) = dest.dimensions();
    let x_start = rect.x.max(0);
    let y_start = rect.y.max(0);
    let x_end = (rect.x + rect.width as i64).min(dest_w as i64);
    let y_end = (rect.y + rect.height as i64).min(dest_h as i64);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    let scale_x = source.width() as f64 / rect.width as f64;
    let scale_y = source.height() as f64 / rect.height as f64;
    let max_x = source.width() as i64 - 1;
    let max_y = source.height() as i64 - 1;

    for py in y_start..y_end {
        let sy = (((py - rect.y) as f64 + 0.5) * scale_y).floor() as i64;
        let sy = sy.clamp(0, max_y) as u32;
        for px in x_start..x_end {
            let sx = (((px - rect.x) as f64 + 0.5) * scale_x).floor() as i64;
            let sx = sx.clamp(0, max_x) as u32;

            let src = source.pixel(sx, sy);
            let dst = dest.pixel(px as u32, py as u32);
            dest.set_pixel(px as u32, py as u32, blend_over(dst, src, opacity));
        }
    }
}

fn blend_over(dst: [u8; 4], src: [u8; 4], opacity: f64) -> [u8; 4] {
    let src_a = src[3] as f64 / 255.0 * opacity;
    if src_a >= 1.0 {
        return src;
    }
    if src_a <= 0.0 {
        return dst;
    }

    let dst_a = dst[3] as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] as f64 * src_a + dst[c] as f64 * dst_a * (1.0 - src_a)) / out_a;
        out[c] = to_channel(value);
    }
    out[3] = to_channel(out_a * 255.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Raster {
        let mut data = Vec::with_capacity((width * height) as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x * 40) as u8, (y * 40) as u8, 90, 255]);
            }
        }
        Raster::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_rotate_zero_is_copy() {
        let source = gradient(5, 4);
        assert_eq!(rotate_about_center(&source, 0.0), source);
        assert_eq!(rotate_about_center(&source, 360.0), source);
    }

    #[test]
    fn test_rotate_180_mirrors_both_axes() {
        let source = gradient(4, 4);
        let rotated = rotate_about_center(&source, 180.0);
        assert_eq!(rotated.pixel(0, 0), source.pixel(3, 3));
        assert_eq!(rotated.pixel(3, 0), source.pixel(0, 3));
        assert_eq!(rotated.pixel(1, 2), source.pixel(2, 1));
    }

    #[test]
    fn test_rotate_leaves_corners_transparent() {
        let source = Raster::new_filled(20, 20, [200, 10, 10, 255]).unwrap();
        let rotated = rotate_about_center(&source, 45.0);
        assert_eq!(rotated.pixel(0, 0)[3], 0);
        assert_eq!(rotated.pixel(10, 10), [200, 10, 10, 255]);
    }

    #[test]
    fn test_fit_letterboxes_wide_source() {
        let source = Raster::new_filled(8, 2, [255, 255, 255, 255]).unwrap();
        let fitted = fit_to_canvas(&source, 8, 8, [0, 0, 0, 255]);
        assert_eq!(fitted.dimensions(), (8, 8));
        assert_eq!(fitted.pixel(4, 0), [0, 0, 0, 255]);
        assert_eq!(fitted.pixel(4, 4), [255, 255, 255, 255]);
        assert_eq!(fitted.pixel(4, 7), [0, 0, 0, 255]);
    }

    #[test]
    fn test_fit_same_size_opaque_is_identity() {
        let source = gradient(6, 3);
        assert_eq!(fit_to_canvas(&source, 6, 3, [0, 0, 0, 255]), source);
    }

    #[test]
    fn test_blit_scaled_clips_to_canvas() {
        let mut dest = Raster::new_filled(4, 4, [0, 0, 0, 255]).unwrap();
        let source = Raster::new_filled(2, 2, [9, 9, 9, 255]).unwrap();
        blit_scaled(&mut dest, &source, Rect::new(2, 2, 4, 4), 1.0);
        assert_eq!(dest.pixel(3, 3), [9, 9, 9, 255]);
        assert_eq!(dest.pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_composite_half_opacity() {
        let mut dest = Raster::new_filled(1, 1, [0, 0, 0, 255]).unwrap();
        let source = Raster::new_filled(1, 1, [200, 100, 50, 255]).unwrap();
        composite_over(&mut dest, &source, 0, 0, 0.5);
        assert_eq!(dest.pixel(0, 0), [100, 50, 25, 255]);
    }
}
