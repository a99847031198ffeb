use std::sync::Arc;

use tracing::info;

use crate::assets::VisualAsset;
use crate::error::{Result, TimelineError};
use crate::timeline::model::Timeline;
use crate::timeline::types::Transition;

impl Timeline {
    /// Build a timeline showing every asset for the same duration, covering
    /// exactly `target_duration` seconds once boundary overlaps are subtracted.
    ///
    /// The first item cuts in; every later item enters with `transition`.
    pub fn slideshow(
        assets: &[Arc<VisualAsset>],
        target_duration: f64,
        transition: Transition,
    ) -> Result<Timeline> {
        if assets.is_empty() {
            return Err(TimelineError::InvalidPlacement {
                reason: "slideshow needs at least one asset".to_string(),
            }
            .into());
        }
        if !target_duration.is_finite() || target_duration <= 0.0 {
            return Err(TimelineError::InvalidPlacement {
                reason: format!("target duration must be positive, got {}", target_duration),
            }
            .into());
        }

        let duration = slide_duration(assets.len(), target_duration, &transition);
        let mut timeline = Timeline::with_target_duration(target_duration);
        for (index, asset) in assets.iter().enumerate() {
            let incoming = if index == 0 { Transition::none() } else { transition };
            timeline.append(Arc::clone(asset), duration, incoming)?;
        }

        info!(
            "Built slideshow of {} items at {:.3}s each covering {:.3}s",
            assets.len(),
            duration,
            target_duration
        );
        Ok(timeline)
    }
}

/// Per-item duration `d` with `n·d − (n−1)·overlap = total`, where the
/// overlap is the transition window capped at half an item.
fn slide_duration(count: usize, total: f64, transition: &Transition) -> f64 {
    let n = count as f64;
    if !transition.bridges() || count == 1 {
        return total / n;
    }

    let window = transition.duration;
    let uncapped = (total + (n - 1.0) * window) / n;
    if window <= uncapped / 2.0 {
        uncapped
    } else {
        2.0 * total / (n + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    fn assets(count: usize) -> Vec<Arc<VisualAsset>> {
        (0..count)
            .map(|i| VisualAsset::image(format!("slide-{}", i), Raster::new_filled(2, 2, [9, 9, 9, 255]).unwrap()))
            .collect()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_three_slides_with_fades() {
        let timeline = Timeline::slideshow(&assets(3), 8.0, Transition::fade(0.5)).unwrap();
        assert_eq!(timeline.len(), 3);
        for item in timeline.items() {
            assert_close(item.duration, 3.0);
        }
        assert_close(timeline.total_duration(), 8.0);
        assert!(timeline.gaps().is_empty());
    }

    #[test]
    fn test_hard_cuts_split_evenly() {
        let timeline = Timeline::slideshow(&assets(4), 10.0, Transition::none()).unwrap();
        assert_close(timeline.items()[3].start, 7.5);
        assert_close(timeline.total_duration(), 10.0);
    }

    #[test]
    fn test_long_transitions_are_capped() {
        let timeline = Timeline::slideshow(&assets(3), 4.0, Transition::fade(5.0)).unwrap();
        assert_close(timeline.items()[0].duration, 2.0);
        assert_close(timeline.total_duration(), 4.0);
        assert!(timeline.gaps().is_empty());
        assert!(timeline.active_at(1.5).len() <= 2);
    }

    #[test]
    fn test_invalid_slideshows() {
        assert!(Timeline::slideshow(&[], 5.0, Transition::none()).is_err());
        assert!(Timeline::slideshow(&assets(2), 0.0, Transition::none()).is_err());
    }
}
