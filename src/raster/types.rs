use image::{ImageBuffer, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{RasterError, Result};

/// Channels per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Fully transparent pixel used for out-of-bounds samples
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// The colour as an opaque RGBA pixel
    pub fn to_rgba(self) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], 255]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A decoded 2D grid of RGBA pixels, row-major, 8 bits per channel.
///
/// A `Raster` always has a non-zero area and a storage length of exactly
/// `width * height * 4`; every constructor enforces this. Rasters move between
/// pipeline stages by value.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    buffer: RgbaImage,
}

impl Raster {
    /// Wrap an existing image buffer, rejecting zero-area images
    pub fn from_image(buffer: RgbaImage) -> Result<Self> {
        check_dimensions(buffer.width(), buffer.height())?;
        Ok(Self { buffer })
    }

    /// Create a raster from raw RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;

        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(RasterError::InvalidRaster {
                width,
                height,
                reason: format!("storage holds {} bytes, expected {}", data.len(), expected),
            }
            .into());
        }

        let buffer = ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
            RasterError::InvalidRaster {
                width,
                height,
                reason: "buffer rejected by image container".to_string(),
            }
        })?;
        Ok(Self { buffer })
    }

    /// Create a raster with every pixel set to `pixel`
    pub fn new_filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self> {
        check_dimensions(width, height)?;
        let buffer = ImageBuffer::from_pixel(width, height, Rgba(pixel));
        Ok(Self { buffer })
    }

    /// Create a fully transparent raster
    pub fn new_transparent(width: u32, height: u32) -> Result<Self> {
        Self::new_filled(width, height, TRANSPARENT)
    }

    /// Decode an image file into a raster
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|_| crate::error::AssetError::LoadFailed {
            path: path.display().to_string(),
        })?;
        Self::from_image(image.to_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(pixel));
    }

    /// Raw row-major RGBA bytes
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn into_image(self) -> RgbaImage {
        self.buffer
    }

    /// Save the raster as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> std::result::Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidRaster {
            width,
            height,
            reason: "raster has zero area".to_string(),
        }
        .into());
    }
    Ok(())
}
