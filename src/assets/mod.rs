//! # Visual Assets
//!
//! Immutable, already-decoded images and clips, plus a thin directory
//! loader standing in for the ingestion collaborator.

pub mod loader;
pub mod types;

pub use loader::AssetLoader;
pub use types::{AssetId, AssetKind, AssetSource, VisualAsset};
