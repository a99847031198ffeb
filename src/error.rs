use thiserror::Error;

use crate::export::ExportProgress;
use crate::timeline::{Interval, ItemId};

/// Main error type for the Reel-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Raster construction and transform errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("Invalid raster {width}x{height}: {reason}")]
    InvalidRaster {
        width: u32,
        height: u32,
        reason: String,
    },
}

/// Rejected timeline mutations. The timeline is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Placement {requested} overlaps item {existing} at {overlap} without a bridging transition")]
    OverlappingPlacement {
        existing: ItemId,
        requested: Interval,
        overlap: Interval,
    },

    #[error("Invalid placement: {reason}")]
    InvalidPlacement { reason: String },

    #[error("Timeline item not found: {id}")]
    ItemNotFound { id: ItemId },

    #[error("Index {index} out of range for timeline of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Export session failures
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Timeline is incomplete: {} uncovered interval(s), first at {}", .gaps.len(), first_gap(.gaps))]
    IncompleteTimeline { gaps: Vec<Interval> },

    #[error("Timeline has nothing to export")]
    EmptyTimeline,

    #[error("Frame {frame} at {timestamp:.3}s failed: {reason}")]
    Frame {
        frame: u64,
        timestamp: f64,
        item: Option<ItemId>,
        reason: String,
        progress: ExportProgress,
    },

    #[error("Encoder failed at frame {frame}: {reason}")]
    Encoder {
        frame: u64,
        reason: String,
        progress: ExportProgress,
    },

    #[error("Export task failed: {reason}")]
    TaskFailed { reason: String },
}

fn first_gap(gaps: &[Interval]) -> String {
    gaps.first()
        .map(|gap| gap.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl ExportError {
    /// Progress reached before the failure, if any frame work had started
    pub fn progress(&self) -> Option<&ExportProgress> {
        match self {
            Self::Frame { progress, .. } | Self::Encoder { progress, .. } => Some(progress),
            _ => None,
        }
    }
}

/// Asset ingestion errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to load image: {path}")]
    LoadFailed { path: String },

    #[error("No images found in directory: {path}")]
    NoImagesFound { path: String },

    #[error("Clip asset {name} has no frames")]
    EmptySequence { name: String },
}

/// Audio probing errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio duration unavailable: {path}")]
    DurationUnavailable { path: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether the failure is local to one asset and the session can continue
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Raster(RasterError::InvalidRaster { .. }) => true,
            Self::Asset(AssetError::LoadFailed { .. }) => true,
            Self::Asset(AssetError::EmptySequence { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Export(ExportError::IncompleteTimeline { gaps }) => {
                let listed: Vec<String> = gaps.iter().map(|gap| gap.to_string()).collect();
                format!(
                    "The timeline has uncovered time ranges: {}. Extend or add items to fill them before exporting.",
                    listed.join(", ")
                )
            }
            Self::Export(ExportError::Frame { frame, timestamp, item, reason, .. }) => match item {
                Some(item) => format!(
                    "Rendering item {} failed at {:.2}s (frame {}): {}",
                    item, timestamp, frame, reason
                ),
                None => format!("Rendering failed at {:.2}s (frame {}): {}", timestamp, frame, reason),
            },
            Self::Timeline(TimelineError::OverlappingPlacement { existing, .. }) => {
                format!(
                    "That placement overlaps item {}. Move it or add a transition to blend the two.",
                    existing
                )
            }
            Self::Audio(AudioError::LoadFailed { path }) => {
                format!("Could not load audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Asset(AssetError::NoImagesFound { path }) => {
                format!("No supported images (png, jpg, bmp) were found in '{}'.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
