//! # Raster Buffers
//!
//! Owned RGBA pixel storage plus the geometric helpers shared by the
//! transform pipeline and the transition compositor.

pub mod geometry;
pub mod types;

pub use geometry::{blit_scaled, composite_over, fit_to_canvas, rotate_about_center, Rect};
pub use types::{Raster, Rgb, CHANNELS, TRANSPARENT};
