// src/assembler/transitions.rs - Two-raster compositing rules for transition windows

use rayon::prelude::*;

use crate::raster::{
    blit_scaled, composite_over, fit_to_canvas, rotate_about_center, Raster, Rect, TRANSPARENT,
};
use crate::timeline::TransitionKind;

/// Combine the outgoing raster `a` with the incoming raster `b` at blend
/// fraction `p`.
///
/// Pure in `(a, b, p)`: `p <= 0` yields `a` and `p >= 1` yields `b` for
/// every kind. `b` is fitted to `a`'s size when the two differ.
///
/// `Flip` turns the frame over about its vertical centre line like a card:
/// `a` narrows onto the line during the first half, then `b`, printed on the
/// card's back, widens from it. The back face is shown the right way round,
/// so no mirrored image is ever drawn and the window lands exactly on `b`.
pub fn blend(a: &Raster, b: &Raster, p: f64, kind: TransitionKind) -> Raster {
    if p <= 0.0 || p.is_nan() {
        return a.clone();
    }
    if p >= 1.0 {
        return b.clone();
    }

    let (width, height) = a.dimensions();
    let fitted;
    let b = if b.dimensions() == (width, height) {
        b
    } else {
        fitted = fit_to_canvas(b, width, height, TRANSPARENT);
        &fitted
    };

    match kind {
        TransitionKind::None => {
            if p < 0.5 {
                a.clone()
            } else {
                b.clone()
            }
        }
        TransitionKind::Fade => cross_dissolve(a, b, p),
        TransitionKind::SlideLeft => slide(a, b, p, (-1, 0)),
        TransitionKind::SlideRight => slide(a, b, p, (1, 0)),
        TransitionKind::SlideUp => slide(a, b, p, (0, -1)),
        TransitionKind::SlideDown => slide(a, b, p, (0, 1)),
        TransitionKind::ZoomIn => {
            let mut canvas = a.clone();
            draw_scaled_centered(&mut canvas, b, p, 1.0);
            canvas
        }
        TransitionKind::ZoomOut => {
            let mut canvas = b.clone();
            draw_scaled_centered(&mut canvas, a, 1.0 - p, 1.0);
            canvas
        }
        TransitionKind::Rotate => {
            let mut canvas = b.clone();
            let turned = rotate_about_center(a, p * 90.0);
            composite_over(&mut canvas, &turned, 0, 0, (1.0 - p) as f32);
            canvas
        }
        TransitionKind::Flip => {
            if p < 0.5 {
                let mut canvas = b.clone();
                squeeze_horizontally(&mut canvas, a, 1.0 - 2.0 * p);
                canvas
            } else {
                let mut canvas = a.clone();
                squeeze_horizontally(&mut canvas, b, 2.0 * p - 1.0);
                canvas
            }
        }
    }
}

/// Per-channel linear interpolation, rounded
fn cross_dissolve(a: &Raster, b: &Raster, p: f64) -> Raster {
    let data: Vec<u8> = a
        .as_raw()
        .par_iter()
        .zip(b.as_raw().par_iter())
        .map(|(&x, &y)| {
            let value = x as f64 + (y as f64 - x as f64) * p;
            value.round().clamp(0.0, 255.0) as u8
        })
        .collect();

    Raster::from_rgba(a.width(), a.height(), data).unwrap_or_else(|_| a.clone())
}

/// Move both rasters by `p` of the canvas in `direction`, `b` following `a`
fn slide(a: &Raster, b: &Raster, p: f64, direction: (i64, i64)) -> Raster {
    let (width, height) = a.dimensions();
    let dx = direction.0 * (p * width as f64).round() as i64;
    let dy = direction.1 * (p * height as f64).round() as i64;
    let (entry_x, entry_y) = (-direction.0 * width as i64, -direction.1 * height as i64);

    let mut canvas = match Raster::new_transparent(width, height) {
        Ok(canvas) => canvas,
        Err(_) => return a.clone(),
    };
    composite_over(&mut canvas, a, dx, dy, 1.0);
    composite_over(&mut canvas, b, entry_x + dx, entry_y + dy, 1.0);
    canvas
}

fn draw_scaled_centered(canvas: &mut Raster, source: &Raster, scale: f64, opacity: f32) {
    let (width, height) = canvas.dimensions();
    let w = (width as f64 * scale).round() as u32;
    let h = (height as f64 * scale).round() as u32;
    blit_scaled(canvas, source, Rect::centered(width, height, w, h), opacity);
}

fn squeeze_horizontally(canvas: &mut Raster, source: &Raster, factor: f64) {
    let (width, height) = canvas.dimensions();
    let w = (width as f64 * factor).round() as u32;
    blit_scaled(canvas, source, Rect::centered(width, height, w, height), 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> Raster {
        Raster::new_filled(8, 6, [value, value, value, 255]).unwrap()
    }

    #[test]
    fn test_boundary_law_for_every_kind() {
        let a = solid(20);
        let b = solid(220);
        for kind in TransitionKind::ALL {
            assert_eq!(blend(&a, &b, 0.0, kind), a, "{} at p=0", kind);
            assert_eq!(blend(&a, &b, 1.0, kind), b, "{} at p=1", kind);
        }
    }

    #[test]
    fn test_flip_folds_then_unfolds_unmirrored() {
        let mut a = solid(90);
        let mut b = solid(90);
        for y in 0..6 {
            for x in 0..4 {
                a.set_pixel(x, y, [255, 0, 0, 255]);
                b.set_pixel(x, y, [0, 255, 0, 255]);
            }
            for x in 4..8 {
                a.set_pixel(x, y, [0, 0, 255, 255]);
                b.set_pixel(x, y, [255, 255, 0, 255]);
            }
        }

        // First quarter: `a` at half width over `b`, left half still on the left
        let folding = blend(&a, &b, 0.25, TransitionKind::Flip);
        assert_eq!(folding.pixel(0, 3), [0, 255, 0, 255]);
        assert_eq!(folding.pixel(2, 3), [255, 0, 0, 255]);
        assert_eq!(folding.pixel(5, 3), [0, 0, 255, 255]);
        assert_eq!(folding.pixel(7, 3), [255, 255, 0, 255]);

        // Third quarter: `b` at half width over `a`, never mirrored
        let unfolding = blend(&a, &b, 0.75, TransitionKind::Flip);
        assert_eq!(unfolding.pixel(0, 3), [255, 0, 0, 255]);
        assert_eq!(unfolding.pixel(2, 3), [0, 255, 0, 255]);
        assert_eq!(unfolding.pixel(5, 3), [255, 255, 0, 255]);
        assert_eq!(unfolding.pixel(7, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn test_fade_midpoint() {
        let out = blend(&solid(0), &solid(200), 0.5, TransitionKind::Fade);
        assert_eq!(out.pixel(3, 3), [100, 100, 100, 255]);
    }

    #[test]
    fn test_slide_left_halfway() {
        let out = blend(&solid(10), &solid(250), 0.5, TransitionKind::SlideLeft);
        // Left half shows the outgoing raster, right half the incoming one
        assert_eq!(out.pixel(0, 0)[0], 10);
        assert_eq!(out.pixel(3, 0)[0], 10);
        assert_eq!(out.pixel(4, 0)[0], 250);
        assert_eq!(out.pixel(7, 5)[0], 250);
    }

    #[test]
    fn test_slide_down_halfway() {
        let out = blend(&solid(10), &solid(250), 0.5, TransitionKind::SlideDown);
        assert_eq!(out.pixel(0, 0)[0], 250);
        assert_eq!(out.pixel(0, 5)[0], 10);
    }

    #[test]
    fn test_zoom_in_grows_from_center() {
        let out = blend(&solid(10), &solid(250), 0.5, TransitionKind::ZoomIn);
        assert_eq!(out.pixel(0, 0)[0], 10);
        assert_eq!(out.pixel(4, 3)[0], 250);
    }

    #[test]
    fn test_blend_is_deterministic() {
        let a = solid(40);
        let b = solid(160);
        for kind in TransitionKind::ALL {
            assert_eq!(blend(&a, &b, 0.37, kind), blend(&a, &b, 0.37, kind));
        }
    }

    #[test]
    fn test_mismatched_sizes_fit_to_outgoing() {
        let a = solid(0);
        let b = Raster::new_filled(4, 4, [255, 255, 255, 255]).unwrap();
        let out = blend(&a, &b, 0.5, TransitionKind::Fade);
        assert_eq!(out.dimensions(), a.dimensions());
    }
}
