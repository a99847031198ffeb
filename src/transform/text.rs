// src/transform/text.rs - Centred text overlay rasterised with fontdue from the bundled font

use std::sync::OnceLock;

use fontdue::{Font, FontSettings};

use crate::error::{CompositorError, Result};
use crate::raster::geometry::to_channel;
use crate::raster::Raster;
use crate::transform::params::TextOverlay;

static FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static FONT: OnceLock<std::result::Result<Font, &'static str>> = OnceLock::new();

fn overlay_font() -> Result<&'static Font> {
    FONT.get_or_init(|| Font::from_bytes(FONT_BYTES, FontSettings::default()))
        .as_ref()
        .map_err(|e| CompositorError::generic(format!("Failed to load overlay font: {}", e)))
}

/// One rasterised glyph, positioned relative to the line origin and baseline
struct PlacedGlyph {
    x: i64,
    /// Offset of the bitmap's top row from the baseline (negative is above)
    y: i64,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

fn layout_line(font: &Font, line: &str, px: f32) -> (Vec<PlacedGlyph>, f32) {
    let mut pen = 0.0f32;
    let mut previous: Option<char> = None;
    let mut glyphs = Vec::with_capacity(line.len());

    for ch in line.chars() {
        if let Some(prev) = previous {
            pen += font.horizontal_kern(prev, ch, px).unwrap_or(0.0);
        }
        let (metrics, coverage) = font.rasterize(ch, px);
        glyphs.push(PlacedGlyph {
            x: pen.round() as i64 + metrics.xmin as i64,
            y: -(metrics.height as i64 + metrics.ymin as i64),
            width: metrics.width,
            height: metrics.height,
            coverage,
        });
        pen += metrics.advance_width;
        previous = Some(ch);
    }

    (glyphs, pen)
}

/// Paint `overlay` centred on `canvas` in the overlay colour.
///
/// Glyphs are rasterised at exactly `size` pixels per em and blended by
/// their coverage. Lines split on `\n`; each line is centred horizontally and
/// the whole block vertically. Pixels outside the canvas are clipped.
pub fn draw_text_centered(canvas: &mut Raster, overlay: &TextOverlay) -> Result<()> {
    if overlay.text.is_empty() {
        return Ok(());
    }

    let font = overlay_font()?;
    let px = overlay.size as f32;
    let (ascent, line_height) = match font.horizontal_line_metrics(px) {
        Some(metrics) => (metrics.ascent, metrics.new_line_size),
        None => (px, px),
    };

    let lines: Vec<_> = overlay.text.lines().map(|line| layout_line(font, line, px)).collect();
    let (canvas_w, canvas_h) = (canvas.width() as f32, canvas.height() as f32);
    let top = (canvas_h - line_height * lines.len() as f32) / 2.0;
    let color = overlay.color.to_rgba();

    for (row, (glyphs, line_width)) in lines.iter().enumerate() {
        let left = ((canvas_w - line_width) / 2.0).round() as i64;
        let baseline = (top + row as f32 * line_height + ascent).round() as i64;

        for glyph in glyphs {
            for gy in 0..glyph.height {
                for gx in 0..glyph.width {
                    let coverage = glyph.coverage[gy * glyph.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    let x = left + glyph.x + gx as i64;
                    let y = baseline + glyph.y + gy as i64;
                    if x >= 0 && y >= 0 && x < canvas.width() as i64 && y < canvas.height() as i64 {
                        blend_coverage(canvas, x as u32, y as u32, color, coverage);
                    }
                }
            }
        }
    }

    Ok(())
}

fn blend_coverage(canvas: &mut Raster, x: u32, y: u32, color: [u8; 4], coverage: u8) {
    let alpha = coverage as f64 / 255.0;
    let under = canvas.pixel(x, y);
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = to_channel(under[c] as f64 * (1.0 - alpha) + color[c] as f64 * alpha);
    }
    out[3] = to_channel(under[3] as f64 * (1.0 - alpha) + 255.0 * alpha);
    canvas.set_pixel(x, y, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Rgb;

    const BLACK: [u8; 4] = [0, 0, 0, 255];

    /// Inclusive bounding box of every pixel that differs from `background`
    fn ink_bounds(raster: &Raster, background: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                if raster.pixel(x, y) == background {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    fn inked_rows(raster: &Raster) -> Vec<u32> {
        (0..raster.height())
            .filter(|&y| (0..raster.width()).any(|x| raster.pixel(x, y) != BLACK))
            .collect()
    }

    fn render(text: &str, size: u32, canvas: u32) -> Raster {
        let mut raster = Raster::new_filled(canvas, canvas, BLACK).unwrap();
        draw_text_centered(&mut raster, &TextOverlay::new(text, Rgb::WHITE, size)).unwrap();
        raster
    }

    #[test]
    fn test_single_glyph_is_centered() {
        let canvas = render("I", 40, 60);
        let (x0, y0, x1, y1) = ink_bounds(&canvas, BLACK).unwrap();

        let center_x = (x0 + x1) as f64 / 2.0;
        let center_y = (y0 + y1) as f64 / 2.0;
        assert!((center_x - 30.0).abs() <= 3.0, "horizontal centre {}", center_x);
        assert!((center_y - 30.0).abs() <= 5.0, "vertical centre {}", center_y);
    }

    #[test]
    fn test_requested_size_is_honoured() {
        let mut previous = 0;
        for size in [12u32, 20, 40, 64] {
            let rows = inked_rows(&render("I", size, 100)).len();
            // Capital height sits between 60% and 100% of the em size
            assert!(rows as f64 >= size as f64 * 0.6, "size {} inked {} rows", size, rows);
            assert!(rows as u32 <= size, "size {} inked {} rows", size, rows);
            assert!(rows > previous);
            previous = rows;
        }
    }

    #[test]
    fn test_small_sizes_are_not_enlarged() {
        let rows = inked_rows(&render("I", 4, 20)).len();
        assert!(rows >= 1 && rows <= 4, "size 4 inked {} rows", rows);
    }

    #[test]
    fn test_stroke_interior_takes_overlay_color() {
        let canvas = render("I", 48, 64);
        assert!(canvas
            .as_raw()
            .chunks(4)
            .any(|px| px[0] >= 250 && px[0] == px[1] && px[1] == px[2]));
    }

    #[test]
    fn test_lines_stack_vertically() {
        let rows = inked_rows(&render("I\nI", 20, 80));
        let (first, last) = (rows[0], rows[rows.len() - 1]);
        // Descender space between the two capitals stays blank
        assert!(((first + 1)..last).any(|y| !rows.contains(&y)));
    }

    #[test]
    fn test_text_is_clipped() {
        let mut canvas = Raster::new_filled(4, 4, BLACK).unwrap();
        draw_text_centered(&mut canvas, &TextOverlay::new("WIDE TEXT", Rgb::WHITE, 64)).unwrap();
        assert_eq!(canvas.dimensions(), (4, 4));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let mut canvas = Raster::new_filled(8, 8, [1, 2, 3, 255]).unwrap();
        let before = canvas.clone();
        draw_text_centered(&mut canvas, &TextOverlay::new("", Rgb::WHITE, 8)).unwrap();
        assert_eq!(canvas, before);
    }
}
