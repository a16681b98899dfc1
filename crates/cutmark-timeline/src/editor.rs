//! Anchor-driven segment editing.
//!
//! The user picks boundaries one at a time. The first pick leaves a pending
//! anchor; the second commits a segment between the two picks, reshaping
//! whatever segments it touches so the timeline stays sorted and
//! non-overlapping. Every operation takes the playback position explicitly
//! and has no side effects beyond the owned [`Timeline`]; the host persists
//! and repaints after each call.

use cutmark_core::Segment;
use tracing::debug;

use crate::state::SavedState;
use crate::timeline::Timeline;

// ── Outcomes ────────────────────────────────────────────────────

/// What a [`SegmentEditor::put_anchor`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// No anchor was pending; the position became the anchor.
    AnchorSet,
    /// Both picks were outside every segment; a new segment was inserted.
    Inserted,
    /// Both picks fell in one segment, which was cut apart.
    Split,
    /// One pick fell in a segment, which was extended to the other pick.
    Extended,
    /// The picks fell in two segments, which were joined.
    Joined,
    /// The anchor was cleared without touching any segment.
    Cleared,
}

/// What a [`SegmentEditor::del_anchor`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelOutcome {
    /// The pending anchor was removed.
    AnchorCleared,
    /// A segment was removed and its other boundary became the anchor.
    SegmentOpened,
    /// The target matched nothing.
    Ignored,
}

// ── Editor ──────────────────────────────────────────────────────

/// Exclusive owner of a [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct SegmentEditor {
    timeline: Timeline,
}

impl SegmentEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Pick a boundary at `position`.
    ///
    /// With `join` disabled, a pair of picks landing in two different segments
    /// leaves the segments untouched and only clears the anchor.
    pub fn put_anchor(&mut self, position: f64, join: bool) -> PutOutcome {
        let Some(anchor) = self.timeline.anchor.take() else {
            self.timeline.anchor = Some(position);
            debug!("Anchor set at {:.3}", position);
            return PutOutcome::AnchorSet;
        };

        let (lo, hi) = if anchor <= position {
            (anchor, position)
        } else {
            (position, anchor)
        };
        let lo_in = self.timeline.segment_at(lo);
        let hi_in = self.timeline.segment_at(hi);

        let outcome = match (lo_in, hi_in) {
            (None, None) => {
                self.replace_range(lo, hi);
                if lo < hi {
                    PutOutcome::Inserted
                } else {
                    PutOutcome::Cleared
                }
            }
            (Some(i), Some(j)) if i == j && lo == hi => PutOutcome::Cleared,
            (Some(i), Some(j)) if i == j => {
                let seg = self.timeline.segments.remove(i);
                if seg.start == lo {
                    self.push(Segment::new(hi, seg.end));
                } else if seg.end == hi {
                    self.push(Segment::new(seg.start, lo));
                } else {
                    self.push(Segment::new(seg.start, lo));
                    self.push(Segment::new(hi, seg.end));
                }
                PutOutcome::Split
            }
            (Some(i), None) => {
                let start = self.timeline.segments.remove(i).start;
                self.replace_range(start, hi);
                PutOutcome::Extended
            }
            (None, Some(j)) => {
                let end = self.timeline.segments.remove(j).end;
                self.replace_range(lo, end);
                PutOutcome::Extended
            }
            (Some(i), Some(j)) if join => {
                let (first, second) = (i.min(j), i.max(j));
                let end = self.timeline.segments.remove(second).end;
                let start = self.timeline.segments.remove(first).start;
                self.replace_range(start, end);
                PutOutcome::Joined
            }
            (Some(_), Some(_)) => PutOutcome::Cleared,
        };

        self.timeline.segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        debug!(
            "Put {:.3}-{:.3}: {:?}, {} segments",
            lo,
            hi,
            outcome,
            self.timeline.segments.len()
        );
        outcome
    }

    /// Delete the pending anchor or the segment boundary equal to `target`.
    ///
    /// Deleting a segment boundary removes the segment and leaves its other
    /// boundary as the pending anchor, so the segment can be redrawn.
    pub fn del_anchor(&mut self, target: f64) -> DelOutcome {
        if self.timeline.anchor == Some(target) {
            self.timeline.anchor = None;
            debug!("Anchor at {:.3} cleared", target);
            return DelOutcome::AnchorCleared;
        }

        let Some(i) = self
            .timeline
            .segments
            .iter()
            .position(|s| s.has_boundary(target))
        else {
            return DelOutcome::Ignored;
        };

        let seg = self.timeline.segments.remove(i);
        let other = if seg.start == target { seg.end } else { seg.start };
        self.timeline.anchor = Some(other);
        debug!(
            "Segment {} opened, anchor at {:.3}, {} segments",
            seg,
            other,
            self.timeline.segments.len()
        );
        DelOutcome::SegmentOpened
    }

    /// The pending anchor, or else the segment boundary nearest to `position`.
    ///
    /// On equal distance the earlier boundary wins.
    pub fn closest_anchor(&self, position: f64) -> Option<f64> {
        if self.timeline.anchor.is_some() {
            return self.timeline.anchor;
        }
        let mut best: Option<(f64, f64)> = None;
        for t in self.timeline.segments.iter().flat_map(|s| [s.start, s.end]) {
            let diff = (t - position).abs();
            if best.map_or(true, |(_, d)| diff < d) {
                best = Some((t, diff));
            }
        }
        best.map(|(t, _)| t)
    }

    /// Rebuild the timeline from a saved state.
    ///
    /// Each saved segment is replayed as two picks, the second with joining
    /// disabled, then the saved anchor is set directly.
    pub fn restore(&mut self, state: &SavedState) {
        self.timeline = Timeline::new();
        for seg in &state.segments {
            self.put_anchor(seg.start, true);
            self.put_anchor(seg.end, false);
        }
        self.timeline.anchor = state.anchor;
        debug!(
            "Restored {} segments, anchor {:?}",
            self.timeline.segments.len(),
            self.timeline.anchor
        );
    }

    /// Drop every segment fully inside `[lo, hi]` and insert `lo..hi`.
    fn replace_range(&mut self, lo: f64, hi: f64) {
        self.timeline.segments.retain(|s| !s.within(lo, hi));
        self.push(Segment::new(lo, hi));
    }

    fn push(&mut self, segment: Segment) {
        if !segment.is_empty() {
            self.timeline.segments.push(segment);
        }
    }
}
