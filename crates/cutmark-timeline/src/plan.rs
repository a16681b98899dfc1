//! Export planning: segment inversion and frame-accurate boundary adjustment.
//!
//! Both steps are pure. An empty index degrades snapping to a no-op.

use cutmark_core::{round_ms, EditMode, Segment};
use cutmark_media::TimestampIndex;

use crate::timeline::Timeline;

/// The complement of `segments` over `[0, total_duration]`.
///
/// No leading gap is produced when the first segment starts on the first
/// frame, and no trailing gap when the last one ends on the last frame or
/// less than a frame before `total_duration`. Zero-length gaps between
/// abutting segments are skipped.
pub fn invert(
    segments: &[Segment],
    total_duration: f64,
    index: &TimestampIndex,
    frame_duration: f64,
) -> Vec<Segment> {
    let mut gaps = Vec::new();

    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        push_gap(&mut gaps, 0.0, total_duration);
        return gaps;
    };

    let on_first_frame = first.start == 0.0 || index.is_first_frame(first.start);
    if !on_first_frame {
        push_gap(&mut gaps, 0.0, first.start);
    }

    for pair in segments.windows(2) {
        push_gap(&mut gaps, pair[0].end, pair[1].start);
    }

    let on_last_frame =
        total_duration - last.end < frame_duration || index.is_last_frame(last.end);
    if !on_last_frame {
        push_gap(&mut gaps, last.end, total_duration);
    }

    gaps
}

fn push_gap(gaps: &mut Vec<Segment>, start: f64, end: f64) {
    if start < end {
        gaps.push(Segment { start, end });
    }
}

/// Nudge and snap segment boundaries so cuts land on real frames.
///
/// In keep mode the end moves one frame later so the last frame is kept; in
/// remove mode the start moves one frame later so the frame after a removed
/// range survives. Each boundary then snaps to the nearest frame strictly
/// within one frame, and is rounded to milliseconds. A start that lands
/// before the previous end is clamped to it, and segments that collapse to
/// zero length are dropped, so the result never overlaps.
pub fn adjust(
    segments: &[Segment],
    mode: EditMode,
    index: &TimestampIndex,
    frame_duration: f64,
) -> Vec<Segment> {
    let mut adjusted: Vec<Segment> = Vec::with_capacity(segments.len());
    for seg in segments {
        let (mut a, mut b) = (seg.start, seg.end);
        match mode {
            EditMode::Keep => b += frame_duration,
            EditMode::Remove => a += frame_duration,
        }
        let mut a = round_ms(index.snap(a, frame_duration));
        let b = round_ms(index.snap(b, frame_duration));
        if let Some(prev) = adjusted.last() {
            a = a.max(prev.end);
        }
        if a < b {
            adjusted.push(Segment { start: a, end: b });
        }
    }
    adjusted
}

/// The adjusted segments to cut out of the source and concatenate.
///
/// In remove mode the timeline is inverted first, so the result always
/// lists the footage that ends up in the output.
pub fn export_segments(
    timeline: &Timeline,
    mode: EditMode,
    total_duration: f64,
    index: &TimestampIndex,
    frame_duration: f64,
) -> Vec<Segment> {
    let kept = match mode {
        EditMode::Keep => timeline.segments().to_vec(),
        EditMode::Remove => invert(timeline.segments(), total_duration, index, frame_duration),
    };
    adjust(&kept, mode, index, frame_duration)
}
