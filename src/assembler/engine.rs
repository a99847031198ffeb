use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::assembler::cache::{CacheKey, RasterCache};
use crate::assembler::transitions::blend;
use crate::config::RenderConfig;
use crate::error::{CompositorError, RasterError, Result};
use crate::raster::{fit_to_canvas, Raster, Rgb};
use crate::timeline::{ItemId, Timeline, TimelineItem, TIME_EPSILON};
use crate::transform::transform;

/// One timestamped, fully composited raster at output resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub raster: Raster,
    pub timestamp: f64,
}

/// A frame that could not be composed, with the item whose source failed
#[derive(Debug)]
pub struct FrameFault {
    pub item: Option<ItemId>,
    pub error: CompositorError,
}

/// Number of frames sampled from `duration` seconds at `fps`: `ceil(duration·fps)`
pub fn frame_count(duration: f64, fps: f64) -> u64 {
    if !(duration.is_finite() && fps.is_finite()) || duration <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (duration * fps - TIME_EPSILON).ceil().max(0.0) as u64
}

/// Turns a timeline into frames at a fixed output size.
///
/// Resolved rasters (transformed and fitted to the canvas) are memoized per
/// assembler, so independent assemblers never share mutable state.
pub struct ClipAssembler {
    width: u32,
    height: u32,
    background: Rgb,
    cache: RasterCache,
    pool: ThreadPool,
    placeholder: Raster,
}

impl ClipAssembler {
    /// Create an assembler producing `width` x `height` frames
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::with_config(width, height, &RenderConfig::default())
    }

    /// Create an assembler using the render settings of a configuration
    pub fn with_config(width: u32, height: u32, config: &RenderConfig) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidRaster {
                width,
                height,
                reason: "output canvas must have a non-zero area".to_string(),
            }
            .into());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads.max(1))
            .build()
            .map_err(|e| CompositorError::generic(format!("Failed to build worker pool: {}", e)))?;

        Ok(Self {
            width,
            height,
            background: config.background,
            cache: RasterCache::new(config.cache_capacity),
            pool,
            placeholder: checkerboard(width, height)?,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn cache(&self) -> &RasterCache {
        &self.cache
    }

    /// Frame showing the timeline at `t` seconds
    pub fn frame_at(&mut self, timeline: &Timeline, t: f64) -> Result<Frame> {
        self.compose(timeline, t).map_err(|fault| fault.error)
    }

    /// Like [`ClipAssembler::frame_at`], also naming the item that failed
    pub fn compose(&mut self, timeline: &Timeline, t: f64) -> std::result::Result<Frame, FrameFault> {
        let active = timeline.active_at(t);

        let raster = match active.as_slice() {
            [] => self.background_raster().map_err(|error| FrameFault { item: None, error })?,
            [only] => self.resolved(only, t)?.as_ref().clone(),
            [outgoing, incoming, ..] => {
                let a = self.resolved(outgoing, t)?;
                let b = self.resolved(incoming, t)?;
                let window = outgoing.end() - incoming.start;
                let p = if window > TIME_EPSILON {
                    (t - incoming.start) / window
                } else {
                    1.0
                };
                blend(&a, &b, p.clamp(0.0, 1.0), incoming.transition.kind)
            }
        };

        Ok(Frame { raster, timestamp: t })
    }

    /// Frame for interactive preview; never fails.
    ///
    /// A resolution failure yields a checkerboard placeholder and a warning.
    pub fn preview_frame(&mut self, timeline: &Timeline, t: f64) -> Frame {
        match self.compose(timeline, t) {
            Ok(frame) => frame,
            Err(fault) => {
                match fault.item {
                    Some(item) => warn!("Preview at {:.3}s failed for item {}: {}", t, item, fault.error),
                    None => warn!("Preview at {:.3}s failed: {}", t, fault.error),
                }
                Frame {
                    raster: self.placeholder.clone(),
                    timestamp: t,
                }
            }
        }
    }

    /// Lazy, restartable sequence of `ceil(D·fps)` frames at `i / fps`,
    /// where `D` is the timeline's target duration
    pub fn frames<'a>(&'a mut self, timeline: &'a Timeline, fps: f64) -> Frames<'a> {
        let total = frame_count(timeline.target_duration(), fps);
        Frames {
            assembler: self,
            timeline,
            fps,
            next: 0,
            total,
        }
    }

    /// Resolve every item's source frames ahead of sequential production.
    ///
    /// Work runs on the worker pool; results are inserted in timeline order
    /// so the cache contents do not depend on scheduling. Failures are left
    /// for the frame loop to report. Returns the number of rasters resolved.
    pub fn prefetch(&mut self, timeline: &Timeline) -> usize {
        let mut seen = HashSet::new();
        let mut jobs: Vec<(CacheKey, &TimelineItem, usize)> = Vec::new();

        for item in timeline.items() {
            for frame in 0..item.asset.frame_count() {
                if jobs.len() >= self.cache_room() {
                    break;
                }
                let key = CacheKey {
                    asset: item.asset.id,
                    frame,
                    params: item.params.key(),
                };
                if !self.cache.contains(&key) && seen.insert(key.clone()) {
                    jobs.push((key, item, frame));
                }
            }
        }

        if jobs.is_empty() {
            return 0;
        }

        let (width, height, background) = (self.width, self.height, self.background);
        let resolve_all = || {
            jobs.par_iter()
                .map(|(_, item, frame)| resolve_source(item, *frame, width, height, background))
                .collect::<Vec<_>>()
        };
        let results = self.pool.install(resolve_all);

        let mut resolved = 0;
        for ((key, item, _), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(raster) => {
                    self.cache.insert(key, Arc::new(raster));
                    resolved += 1;
                }
                Err(e) => debug!("Prefetch skipped item {}: {}", item.id, e),
            }
        }

        info!("Prefetched {} resolved rasters", resolved);
        resolved
    }

    fn cache_room(&self) -> usize {
        self.cache.capacity().saturating_sub(self.cache.len())
    }

    fn resolved(&mut self, item: &TimelineItem, t: f64) -> std::result::Result<Arc<Raster>, FrameFault> {
        let frame = item.asset.frame_index_at(t - item.start);
        let key = CacheKey {
            asset: item.asset.id,
            frame,
            params: item.params.key(),
        };

        if let Some(raster) = self.cache.get(&key) {
            return Ok(raster);
        }

        debug!("Cache miss for {} frame {} (item {})", item.asset.id, frame, item.id);
        let raster = resolve_source(item, frame, self.width, self.height, self.background)
            .map(Arc::new)
            .map_err(|error| FrameFault {
                item: Some(item.id),
                error,
            })?;
        self.cache.insert(key, Arc::clone(&raster));
        Ok(raster)
    }

    fn background_raster(&self) -> Result<Raster> {
        Raster::new_filled(self.width, self.height, self.background.to_rgba())
    }
}

/// Transform one source frame of an item and fit it onto the output canvas
fn resolve_source(
    item: &TimelineItem,
    frame: usize,
    width: u32,
    height: u32,
    background: Rgb,
) -> Result<Raster> {
    let source = item.asset.raster(frame).ok_or_else(|| {
        CompositorError::generic(format!(
            "asset {} has no source frame {}",
            item.asset.name, frame
        ))
    })?;
    let transformed = transform(source, &item.params)?;
    Ok(fit_to_canvas(&transformed, width, height, background.to_rgba()))
}

/// Placeholder shown when a preview frame cannot be composed
fn checkerboard(width: u32, height: u32) -> Result<Raster> {
    const CELL: u32 = 16;
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        if (x / CELL + y / CELL) % 2 == 0 {
            image::Rgba([96, 96, 96, 255])
        } else {
            image::Rgba([160, 160, 160, 255])
        }
    });
    Raster::from_image(image)
}

/// Iterator returned by [`ClipAssembler::frames`]
pub struct Frames<'a> {
    assembler: &'a mut ClipAssembler,
    timeline: &'a Timeline,
    fps: f64,
    next: u64,
    total: u64,
}

impl Frames<'_> {
    /// Total number of frames in the sequence
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Index of the next frame to be produced
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Produce the next frame, naming the failing item on error
    pub fn next_composed(&mut self) -> Option<std::result::Result<Frame, FrameFault>> {
        if self.next >= self.total {
            return None;
        }
        let timestamp = self.next as f64 / self.fps;
        self.next += 1;
        Some(self.assembler.compose(self.timeline, timestamp))
    }
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_composed().map(|result| result.map_err(|fault| fault.error))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetId, AssetKind, AssetSource, VisualAsset};
    use crate::filters::FilterKind;
    use crate::timeline::{Transition, TransitionKind};
    use crate::transform::TransformParams;

    fn solid(width: u32, height: u32, value: u8) -> Raster {
        Raster::new_filled(width, height, [value, value, value, 255]).unwrap()
    }

    fn assembler() -> ClipAssembler {
        ClipAssembler::new(8, 4).unwrap()
    }

    fn two_item_timeline(kind: TransitionKind) -> Timeline {
        let mut timeline = Timeline::new();
        timeline
            .append(VisualAsset::image("a", solid(8, 4, 20)), 2.0, Transition::none())
            .unwrap();
        timeline
            .append(VisualAsset::image("b", solid(8, 4, 220)), 2.0, Transition::new(kind, 1.0))
            .unwrap();
        timeline
    }

    #[test]
    fn test_preview_falls_back_to_placeholder() {
        let broken = Arc::new(VisualAsset {
            id: AssetId::next(),
            kind: AssetKind::Clip,
            name: "broken".to_string(),
            source: AssetSource::Sequence { frames: vec![], fps: 1.0 },
            intrinsic_duration: None,
            path: None,
        });
        let mut timeline = Timeline::new();
        timeline.append(broken, 2.0, Transition::none()).unwrap();

        let mut assembler = assembler();
        assert!(assembler.frame_at(&timeline, 0.5).is_err());

        let preview = assembler.preview_frame(&timeline, 0.5);
        assert_eq!(preview.timestamp, 0.5);
        assert_eq!(preview.raster, checkerboard(8, 4).unwrap());
    }

    #[test]
    fn test_preview_matches_frame_when_resolvable() {
        let timeline = two_item_timeline(TransitionKind::Fade);
        let mut assembler = assembler();
        let expected = assembler.frame_at(&timeline, 1.5).unwrap();
        assert_eq!(assembler.preview_frame(&timeline, 1.5), expected);
    }

    #[test]
    fn test_frame_count_is_ceiling() {
        assert_eq!(frame_count(8.0, 30.0), 240);
        assert_eq!(frame_count(1.01, 10.0), 11);
        assert_eq!(frame_count(0.0, 30.0), 0);
        assert_eq!(frame_count(1.0, 0.0), 0);
    }

    #[test]
    fn test_single_item_is_letterboxed() {
        let mut timeline = Timeline::new();
        timeline
            .append(VisualAsset::image("square", solid(4, 4, 200)), 1.0, Transition::none())
            .unwrap();

        let frame = assembler().frame_at(&timeline, 0.5).unwrap();
        assert_eq!(frame.raster.dimensions(), (8, 4));
        assert_eq!(frame.raster.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(frame.raster.pixel(4, 2), [200, 200, 200, 255]);
        assert_eq!(frame.raster.pixel(7, 3), [0, 0, 0, 255]);
    }

    #[test]
    fn test_gap_renders_background() {
        let mut timeline = Timeline::new();
        timeline
            .place(VisualAsset::image("late", solid(8, 4, 90)), 2.0, 1.0, Transition::none())
            .unwrap();
        let config = RenderConfig {
            background: Rgb::new(1, 2, 3),
            ..RenderConfig::default()
        };
        let mut assembler = ClipAssembler::with_config(8, 4, &config).unwrap();

        let frame = assembler.frame_at(&timeline, 1.0).unwrap();
        assert_eq!(frame.raster.pixel(5, 1), [1, 2, 3, 255]);
    }

    #[test]
    fn test_fade_window_blends() {
        let timeline = two_item_timeline(TransitionKind::Fade);
        let mut assembler = assembler();

        // Window is [1.0, 2.0): outgoing only before, incoming only after
        assert_eq!(assembler.frame_at(&timeline, 0.9).unwrap().raster.pixel(0, 0)[0], 20);
        assert_eq!(assembler.frame_at(&timeline, 1.5).unwrap().raster.pixel(0, 0)[0], 120);
        assert_eq!(assembler.frame_at(&timeline, 2.0).unwrap().raster.pixel(0, 0)[0], 220);
    }

    #[test]
    fn test_window_start_matches_outgoing() {
        for kind in TransitionKind::ALL.into_iter().filter(|k| *k != TransitionKind::None) {
            let timeline = two_item_timeline(kind);
            let mut assembler = assembler();
            let frame = assembler.frame_at(&timeline, 1.0).unwrap();
            assert_eq!(frame.raster, solid(8, 4, 20), "{}", kind);
        }
    }

    #[test]
    fn test_frames_are_restartable() {
        let timeline = two_item_timeline(TransitionKind::SlideLeft);
        let mut assembler = assembler();

        let first: Vec<Frame> = assembler.frames(&timeline, 10.0).map(|f| f.unwrap()).collect();
        let second: Vec<Frame> = assembler.frames(&timeline, 10.0).map(|f| f.unwrap()).collect();
        let fresh: Vec<Frame> = ClipAssembler::new(8, 4)
            .unwrap()
            .frames(&timeline, 10.0)
            .map(|f| f.unwrap())
            .collect();

        assert_eq!(first.len(), 30);
        assert_eq!(first, second);
        assert_eq!(first, fresh);
        assert!(first.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_params_change_is_not_stale() {
        let mut timeline = Timeline::new();
        let id = timeline
            .append(VisualAsset::image("a", solid(8, 4, 100)), 1.0, Transition::none())
            .unwrap();
        let mut assembler = assembler();

        let before = assembler.frame_at(&timeline, 0.0).unwrap();
        timeline
            .set_params(id, TransformParams::identity().with_filter(FilterKind::Invert))
            .unwrap();
        let after = assembler.frame_at(&timeline, 0.0).unwrap();

        assert_eq!(before.raster.pixel(0, 0)[0], 100);
        assert_eq!(after.raster.pixel(0, 0)[0], 155);
    }

    #[test]
    fn test_prefetch_fills_cache() {
        let timeline = two_item_timeline(TransitionKind::Fade);
        let mut assembler = assembler();

        assert_eq!(assembler.prefetch(&timeline), 2);
        assert_eq!(assembler.prefetch(&timeline), 0);
        let _ = assembler.frame_at(&timeline, 1.5).unwrap();
        assert_eq!(assembler.cache().stats().1, 0);
    }

    #[test]
    fn test_clip_frames_follow_local_time() {
        let clip = VisualAsset::clip("clip", vec![solid(8, 4, 10), solid(8, 4, 30)], 2.0).unwrap();
        let mut timeline = Timeline::new();
        timeline.place(clip, 1.0, 2.0, Transition::none()).unwrap();
        let mut assembler = assembler();

        assert_eq!(assembler.frame_at(&timeline, 1.2).unwrap().raster.pixel(0, 0)[0], 10);
        assert_eq!(assembler.frame_at(&timeline, 1.6).unwrap().raster.pixel(0, 0)[0], 30);
        assert_eq!(assembler.frame_at(&timeline, 2.1).unwrap().raster.pixel(0, 0)[0], 10);
    }

    #[test]
    fn test_zero_canvas_rejected() {
        assert!(ClipAssembler::new(0, 10).is_err());
    }
}
