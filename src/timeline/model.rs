use std::sync::Arc;

use tracing::debug;

use crate::assets::VisualAsset;
use crate::error::{Result, TimelineError};
use crate::timeline::types::{
    Interval, ItemId, ReorderPolicy, TimelineItem, Transition, TIME_EPSILON,
};
use crate::transform::TransformParams;

/// Ordered placements plus the duration they should cover.
///
/// Order index is the item's position in [`Timeline::items`]; it follows
/// placement order and is renumbered implicitly on removal. Any successful
/// mutation leaves the layout valid: two items only overlap when the later
/// one's transition bridges the overlap, and no instant is covered by more
/// than two items.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    items: Vec<TimelineItem>,
    target_duration: Option<f64>,
    reorder_policy: ReorderPolicy,
    next_id: u64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty timeline that should cover `target_duration` seconds
    pub fn with_target_duration(target_duration: f64) -> Self {
        let mut timeline = Self::new();
        timeline.set_target_duration(target_duration);
        timeline
    }

    pub fn with_reorder_policy(mut self, policy: ReorderPolicy) -> Self {
        self.reorder_policy = policy;
        self
    }

    pub fn reorder_policy(&self) -> ReorderPolicy {
        self.reorder_policy
    }

    /// Set the duration the items should cover, typically the audio length.
    /// Negative or non-finite values clear it.
    pub fn set_target_duration(&mut self, duration: f64) {
        self.target_duration = (duration.is_finite() && duration >= 0.0).then_some(duration);
    }

    /// Target duration, or the end of the last item when none was set
    pub fn target_duration(&self) -> f64 {
        self.target_duration.unwrap_or_else(|| self.total_duration())
    }

    /// Items in order-index order
    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&TimelineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Current order index of an item
    pub fn order_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// End of the latest item (0 for an empty timeline)
    pub fn total_duration(&self) -> f64 {
        self.items.iter().map(TimelineItem::end).fold(0.0, f64::max)
    }

    /// Place `asset` at `start` for `duration` seconds.
    ///
    /// Fails with `InvalidPlacement` for a non-positive duration or negative
    /// start and with `OverlappingPlacement` when the new interval overlaps an
    /// item without a bridging transition. The timeline is unchanged on error.
    pub fn place(
        &mut self,
        asset: Arc<VisualAsset>,
        start: f64,
        duration: f64,
        transition: Transition,
    ) -> Result<ItemId> {
        validate_placement(start, duration, &transition)?;

        let id = ItemId(self.next_id);
        let candidate = TimelineItem {
            id,
            asset,
            start,
            duration,
            transition,
            params: TransformParams::identity(),
        };

        let mut proposed: Vec<&TimelineItem> = self.items.iter().collect();
        proposed.push(&candidate);
        check_layout(&proposed, id)?;

        debug!(
            "Placed {} ({}) at {} with {} transition",
            id,
            candidate.asset.name,
            candidate.interval(),
            candidate.transition.kind
        );
        self.next_id += 1;
        self.items.push(candidate);
        Ok(id)
    }

    /// Place `asset` after the current last item, overlapping it by the
    /// transition's blend window (at most half of either item).
    pub fn append(
        &mut self,
        asset: Arc<VisualAsset>,
        duration: f64,
        transition: Transition,
    ) -> Result<ItemId> {
        let start = match self.last_by_time() {
            Some(previous) => {
                let overlap = transition.overlap_between(previous.duration, duration);
                (previous.end() - overlap).max(0.0)
            }
            None => 0.0,
        };
        self.place(asset, start, duration, transition)
    }

    /// Remove an item; later items move up one order index
    pub fn remove(&mut self, id: ItemId) -> Result<TimelineItem> {
        let index = self
            .order_of(id)
            .ok_or(TimelineError::ItemNotFound { id })?;
        let removed = self.items.remove(index);
        debug!("Removed {} from order index {}", id, index);
        Ok(removed)
    }

    /// Move an item to `new_index`, shifting the items in between by one.
    ///
    /// Under [`ReorderPolicy::Repack`] start times are then recomputed
    /// back-to-back in the new order; under `PreserveStarts` only the order
    /// changes.
    pub fn reorder(&mut self, id: ItemId, new_index: usize) -> Result<()> {
        let from = self
            .order_of(id)
            .ok_or(TimelineError::ItemNotFound { id })?;
        if new_index >= self.items.len() {
            return Err(TimelineError::IndexOutOfRange {
                index: new_index,
                len: self.items.len(),
            }
            .into());
        }

        let item = self.items.remove(from);
        self.items.insert(new_index, item);

        if self.reorder_policy == ReorderPolicy::Repack {
            self.repack();
        }
        debug!("Reordered {} from {} to {}", id, from, new_index);
        Ok(())
    }

    /// Lay items out back-to-back in order-index order, starting where the
    /// earliest item currently starts. Each boundary overlaps by the incoming
    /// transition's blend window.
    pub fn repack(&mut self) {
        let mut cursor = self
            .items
            .iter()
            .map(|item| item.start)
            .fold(f64::INFINITY, f64::min);
        if !cursor.is_finite() {
            return;
        }

        let mut previous: Option<f64> = None;
        for item in &mut self.items {
            if let Some(previous_duration) = previous {
                cursor -= item.transition.overlap_between(previous_duration, item.duration);
            }
            item.start = cursor.max(0.0);
            cursor = item.end();
            previous = Some(item.duration);
        }
    }

    /// Replace the transform parameters of an item
    pub fn set_params(&mut self, id: ItemId, params: TransformParams) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(TimelineError::ItemNotFound { id })?;
        item.params = params;
        Ok(())
    }

    /// Merged intervals covered by at least one item, in time order
    pub fn total_coverage(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self.items.iter().map(TimelineItem::interval).collect();
        intervals.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end + TIME_EPSILON => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }
        merged
    }

    /// Uncovered parts of `[0, target_duration)`, in time order
    pub fn gaps(&self) -> Vec<Interval> {
        let target = self.target_duration();
        let mut gaps = Vec::new();
        let mut cursor = 0.0;

        for covered in self.total_coverage() {
            if covered.start >= target {
                break;
            }
            let gap = Interval::new(cursor, covered.start.min(target));
            if !gap.is_empty() {
                gaps.push(gap);
            }
            cursor = cursor.max(covered.end);
        }

        let tail = Interval::new(cursor, target);
        if !tail.is_empty() {
            gaps.push(tail);
        }
        gaps
    }

    /// Items active at `t`, earliest start first (never more than two)
    pub fn active_at(&self, t: f64) -> Vec<&TimelineItem> {
        let mut active: Vec<&TimelineItem> =
            self.items.iter().filter(|item| item.is_active_at(t)).collect();
        active.sort_by(|a, b| a.start.total_cmp(&b.start));
        active
    }

    fn last_by_time(&self) -> Option<&TimelineItem> {
        self.items
            .iter()
            .max_by(|a, b| a.end().total_cmp(&b.end()).then(a.start.total_cmp(&b.start)))
    }
}

/// Place onto a copy of `timeline`, leaving the original untouched
pub fn place_on_timeline(
    timeline: &Timeline,
    asset: Arc<VisualAsset>,
    start: f64,
    duration: f64,
    transition: Transition,
) -> Result<Timeline> {
    let mut updated = timeline.clone();
    updated.place(asset, start, duration, transition)?;
    Ok(updated)
}

fn validate_placement(start: f64, duration: f64, transition: &Transition) -> Result<()> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(TimelineError::InvalidPlacement {
            reason: format!("duration must be positive, got {}", duration),
        }
        .into());
    }
    if !start.is_finite() || start < 0.0 {
        return Err(TimelineError::InvalidPlacement {
            reason: format!("start must be zero or later, got {}", start),
        }
        .into());
    }
    if !transition.duration.is_finite() || transition.duration < 0.0 {
        return Err(TimelineError::InvalidPlacement {
            reason: format!("transition duration must be non-negative, got {}", transition.duration),
        }
        .into());
    }
    Ok(())
}

/// Check a proposed layout, blaming the first conflicting existing item.
///
/// Sorted by start, each neighbouring pair may overlap only when the later
/// item's transition bridges the overlap and the later item starts and ends
/// after the earlier one; items two apart may never overlap.
fn check_layout(items: &[&TimelineItem], new_id: ItemId) -> Result<()> {
    let mut sorted: Vec<&TimelineItem> = items.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.id.cmp(&b.id)));

    let conflict = |a: &TimelineItem, b: &TimelineItem, overlap: Interval| {
        let (existing, requested) = if a.id == new_id { (b, a) } else { (a, b) };
        TimelineError::OverlappingPlacement {
            existing: existing.id,
            requested: requested.interval(),
            overlap,
        }
    };

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if let Some(overlap) = a.interval().overlap(&b.interval()) {
            let bridged = b.transition.bridges()
                && overlap.len() <= b.transition.duration + TIME_EPSILON
                && b.start > a.start + TIME_EPSILON
                && b.end() > a.end() + TIME_EPSILON;
            if !bridged {
                return Err(conflict(a, b, overlap).into());
            }
        }
    }

    for triple in sorted.windows(3) {
        let (a, c) = (triple[0], triple[2]);
        if let Some(overlap) = a.interval().overlap(&c.interval()) {
            return Err(conflict(a, c, overlap).into());
        }
    }
    Ok(())
}
