//! # Reel-Compositor
//!
//! Turn a collection of still images and a soundtrack into a timed, transition-blended
//! frame sequence ready for encoding.
//!
//! The library covers the visual composition engine: a deterministic per-image transform
//! pipeline and a timeline assembler that samples placed assets into composited frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reel_compositor::{
//!     assets::AssetLoader,
//!     audio::AudioProbe,
//!     export::{CancellationToken, ExportCoordinator, ExportProfile, PngSequenceSink},
//!     timeline::{Timeline, Transition},
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let images = AssetLoader::load_directory("photos/")?;
//! let duration = AudioProbe::duration("song.wav")?;
//! let timeline = Timeline::slideshow(&images, duration, Transition::fade(0.5))?;
//!
//! let mut sink = PngSequenceSink::new("render/");
//! let outcome = ExportCoordinator::new().run(
//!     &timeline,
//!     &ExportProfile::default(),
//!     &mut sink,
//!     &CancellationToken::new(),
//!     |progress| println!("{:.0}%", progress.percent),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`raster`] - Owned RGBA buffers and geometry helpers
//! - [`filters`] - Fixed catalog of colour and blur filters
//! - [`transform`] - Rotation, colour, filter and text overlay pipeline
//! - [`timeline`] - Placement model with transition-bridged overlaps
//! - [`assembler`] - Frame sampling and transition compositing
//! - [`export`] - Export coordination, progress and frame sinks
//! - [`assets`] / [`audio`] - Ingestion of images and soundtrack length
//! - [`config`] - Configuration management

pub mod assembler;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod raster;
pub mod timeline;
pub mod transform;

// Re-export commonly used types for convenience
pub use crate::{
    assembler::{ClipAssembler, Frame},
    config::Config,
    error::{CompositorError, Result},
    export::{export, CancellationToken, ExportCoordinator, ExportOutcome, ExportProfile},
    raster::Raster,
    timeline::{place_on_timeline, Timeline, Transition, TransitionKind},
    transform::{transform, TransformParams},
};
