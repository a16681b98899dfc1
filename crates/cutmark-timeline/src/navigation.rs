//! Jump targets for anchor and keyframe navigation.

use cutmark_core::search::{sides, Direction};
use cutmark_media::TimestampIndex;

use crate::timeline::Timeline;

/// The next segment boundary or pending anchor from `position`.
///
/// A boundary exactly at `position` is skipped, so repeated jumps advance.
pub fn next_anchor(timeline: &Timeline, position: f64, direction: Direction) -> Option<f64> {
    direction.pick(sides(position, &timeline.boundaries(), 0.0, None))
}

/// The next keyframe at least one frame away from `position`.
///
/// `None` when the index has no keyframes.
pub fn next_keyframe(
    index: &TimestampIndex,
    position: f64,
    frame_duration: f64,
    direction: Direction,
) -> Option<f64> {
    if !index.has_keyframes() {
        return None;
    }
    direction.pick(sides(position, index.keyframes(), frame_duration, None))
}
