//! # Filter Catalog
//!
//! Pure raster adjustments. The catalog is closed: every filter is a fixed
//! chain of primitive colour or blur adjustments.
//!
//! ## Built-in Filters
//!
//! - **identity**, **sepia**, **grayscale**, **blur**, **invert**
//! - **hue-rotate**: parameterised by degrees (`hue-rotate:90`)
//! - **vintage**: sepia(0.5) → contrast(1.2) → brightness(0.9)
//! - **cool**: saturate(0.9) → hue-rotate(180°) → brightness(1.05)
//! - **warm**: sepia(0.3) → saturate(1.4)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reel_compositor::filters::FilterRegistry;
//!
//! let registry = FilterRegistry::new();
//! let vintage = registry.get_filter("vintage").unwrap();
//! assert_eq!(vintage.adjustments().len(), 3);
//! ```

pub mod catalog;
pub mod color;
pub mod registry;

pub use catalog::FilterKind;
pub use color::{apply_chain, Adjustment};
pub use registry::FilterRegistry;
