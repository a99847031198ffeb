//! # Timeline Model
//!
//! Placed assets with start, duration and incoming transition. Mutations
//! are validated synchronously and leave the timeline unchanged on error.

pub mod model;
pub mod sequence;
pub mod types;

pub use model::{place_on_timeline, Timeline};
pub use types::{
    Interval, ItemId, ReorderPolicy, TimelineItem, Transition, TransitionKind, TIME_EPSILON,
};
