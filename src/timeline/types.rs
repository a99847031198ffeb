use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::VisualAsset;
use crate::transform::TransformParams;

/// Tolerance for comparing timeline instants, in seconds
pub const TIME_EPSILON: f64 = 1e-9;

/// Half-open time range `[start, end)` in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= TIME_EPSILON
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Shared part of two intervals, if longer than the tolerance
    pub fn overlap(&self, other: &Interval) -> Option<Interval> {
        let shared = Interval::new(self.start.max(other.start), self.end.min(other.end));
        (!shared.is_empty()).then_some(shared)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.start, self.end)
    }
}

/// Identity of one placement on a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an item blends in over its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    ZoomIn,
    ZoomOut,
    Rotate,
    Flip,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 10] = [
        Self::None,
        Self::Fade,
        Self::SlideLeft,
        Self::SlideRight,
        Self::SlideUp,
        Self::SlideDown,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::Rotate,
        Self::Flip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::SlideLeft => "slide-left",
            Self::SlideRight => "slide-right",
            Self::SlideUp => "slide-up",
            Self::SlideDown => "slide-down",
            Self::ZoomIn => "zoom-in",
            Self::ZoomOut => "zoom-out",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| format!("unknown transition '{}'", s))
    }
}

/// Incoming transition of a timeline item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    /// Longest blend window this transition may bridge, in seconds
    pub duration: f64,
}

impl Transition {
    /// Hard cut, never overlaps
    pub fn none() -> Self {
        Self {
            kind: TransitionKind::None,
            duration: 0.0,
        }
    }

    pub fn new(kind: TransitionKind, duration: f64) -> Self {
        Self { kind, duration }
    }

    pub fn fade(duration: f64) -> Self {
        Self::new(TransitionKind::Fade, duration)
    }

    /// Whether this transition may overlap its predecessor
    pub fn bridges(&self) -> bool {
        self.kind != TransitionKind::None && self.duration > 0.0
    }

    /// Overlap actually used when following an item of `previous` seconds
    /// with one of `duration` seconds: at most half of either item.
    pub fn overlap_between(&self, previous: f64, duration: f64) -> f64 {
        if !self.bridges() {
            return 0.0;
        }
        self.duration.min(previous / 2.0).min(duration / 2.0).max(0.0)
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::none()
    }
}

/// One asset's placement on a timeline
#[derive(Debug, Clone)]
pub struct TimelineItem {
    pub id: ItemId,
    pub asset: Arc<VisualAsset>,
    pub start: f64,
    pub duration: f64,
    pub transition: Transition,
    pub params: TransformParams,
}

impl TimelineItem {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end())
    }

    pub fn is_active_at(&self, t: f64) -> bool {
        self.interval().contains(t)
    }
}

/// What `reorder` does to start times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderPolicy {
    /// Recompute starts back-to-back in the new order
    #[default]
    Repack,
    /// Keep every explicit start; only the order changes
    PreserveStarts,
}
