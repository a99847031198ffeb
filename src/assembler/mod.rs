//! # Clip Assembler
//!
//! Samples a timeline at a fixed rate and composites each instant into one
//! output-sized frame. Active items are resolved through the transform
//! pipeline, fitted onto the canvas and, inside a transition window,
//! blended by the incoming item's transition.

pub mod engine;
pub mod cache;
pub mod transitions;

pub use engine::{frame_count, ClipAssembler, Frame, FrameFault, Frames};
pub use cache::{CacheKey, RasterCache};
pub use transitions::blend;
