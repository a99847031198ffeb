//! # Transform Pipeline
//!
//! Deterministic per-image adjustments: rotation, colour, catalog filter and a
//! centred text overlay, applied in one fixed order.
//!
//! ```rust,no_run
//! use reel_compositor::filters::FilterKind;
//! use reel_compositor::raster::Raster;
//! use reel_compositor::transform::{transform, TransformParams};
//!
//! # fn main() -> reel_compositor::Result<()> {
//! let source = Raster::new_filled(320, 240, [128, 128, 128, 255])?;
//! let params = TransformParams::from_percent(150.0, 100.0, 100.0)
//!     .with_filter(FilterKind::Warm);
//! let output = transform(&source, &params)?;
//! # Ok(())
//! # }
//! ```

pub mod params;
pub mod pipeline;
pub mod text;

pub use params::{ParamsKey, TextOverlay, TransformParams};
pub use pipeline::transform;
