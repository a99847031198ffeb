use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};
use crate::raster::Raster;

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a visual asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset-{}", self.0)
    }
}

/// What an asset represents on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Image,
    Clip,
    OverlayGraphic,
}

/// Pixel source behind an asset
#[derive(Debug, Clone)]
pub enum AssetSource {
    /// A single decoded raster
    Still(Raster),
    /// Pre-rendered frames played at `fps`
    Sequence { frames: Vec<Raster>, fps: f64 },
}

/// An immutable, already-decoded visual asset.
///
/// Assets are shared by `Arc` between timelines; a timeline never owns one.
#[derive(Debug, Clone)]
pub struct VisualAsset {
    pub id: AssetId,
    pub kind: AssetKind,
    pub name: String,
    pub source: AssetSource,
    /// Playback length of pre-recorded clips
    pub intrinsic_duration: Option<f64>,
    /// File the asset was decoded from, if any
    pub path: Option<PathBuf>,
}

impl VisualAsset {
    /// Create a still image asset
    pub fn image<S: Into<String>>(name: S, raster: Raster) -> Arc<Self> {
        Arc::new(Self {
            id: AssetId::next(),
            kind: AssetKind::Image,
            name: name.into(),
            source: AssetSource::Still(raster),
            intrinsic_duration: None,
            path: None,
        })
    }

    /// Create an overlay graphic asset
    pub fn overlay_graphic<S: Into<String>>(name: S, raster: Raster) -> Arc<Self> {
        Arc::new(Self {
            id: AssetId::next(),
            kind: AssetKind::OverlayGraphic,
            name: name.into(),
            source: AssetSource::Still(raster),
            intrinsic_duration: None,
            path: None,
        })
    }

    /// Create a clip asset from pre-rendered frames
    pub fn clip<S: Into<String>>(name: S, frames: Vec<Raster>, fps: f64) -> Result<Arc<Self>> {
        let name = name.into();
        if frames.is_empty() || !(fps.is_finite() && fps > 0.0) {
            return Err(AssetError::EmptySequence { name }.into());
        }

        let intrinsic_duration = Some(frames.len() as f64 / fps);
        Ok(Arc::new(Self {
            id: AssetId::next(),
            kind: AssetKind::Clip,
            name,
            source: AssetSource::Sequence { frames, fps },
            intrinsic_duration,
            path: None,
        }))
    }

    /// Number of distinct source frames
    pub fn frame_count(&self) -> usize {
        match &self.source {
            AssetSource::Still(_) => 1,
            AssetSource::Sequence { frames, .. } => frames.len(),
        }
    }

    /// Source frame shown `local_time` seconds into a placement.
    ///
    /// Clips shorter than their placement loop back to their first frame.
    pub fn frame_index_at(&self, local_time: f64) -> usize {
        match &self.source {
            AssetSource::Still(_) => 0,
            AssetSource::Sequence { frames, fps } => {
                if frames.is_empty() {
                    return 0;
                }
                let index = (local_time.max(0.0) * fps).floor() as usize;
                index % frames.len()
            }
        }
    }

    /// Raster for a source frame index
    pub fn raster(&self, index: usize) -> Option<&Raster> {
        match &self.source {
            AssetSource::Still(raster) => Some(raster),
            AssetSource::Sequence { frames, .. } => frames.get(index),
        }
    }

    /// Natural pixel size of the asset
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.raster(0).map(Raster::dimensions)
    }
}
