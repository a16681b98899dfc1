//! Timeline state: committed segments plus at most one pending anchor.

use cutmark_core::Segment;
use serde::{Deserialize, Serialize};

/// Ordered, non-overlapping segments and an optional pending anchor.
///
/// Only [`SegmentEditor`](crate::SegmentEditor) mutates a timeline; everything
/// else reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub(crate) segments: Vec<Segment>,
    pub(crate) anchor: Option<f64>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments sorted ascending by start.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The pending anchor, if a first boundary has been picked.
    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.anchor.is_none()
    }

    /// Every segment boundary plus the pending anchor, ascending.
    pub fn boundaries(&self) -> Vec<f64> {
        let mut points: Vec<f64> = self
            .segments
            .iter()
            .flat_map(|s| [s.start, s.end])
            .chain(self.anchor)
            .collect();
        points.sort_by(f64::total_cmp);
        points
    }

    /// Whether `position` lies inside (or on the edge of) any segment.
    pub fn contains(&self, position: f64) -> bool {
        self.segments.iter().any(|s| s.contains(position))
    }

    /// Index of the segment containing `position`.
    ///
    /// When two abutting segments share `position`, the later one wins.
    pub fn segment_at(&self, position: f64) -> Option<usize> {
        self.segments.iter().rposition(|s| s.contains(position))
    }

    /// Sorted by start, every segment non-empty, no two overlapping.
    pub fn is_consistent(&self) -> bool {
        self.segments.iter().all(|s| !s.is_empty())
            && self
                .segments
                .windows(2)
                .all(|w| w[0].start <= w[1].start && w[0].end <= w[1].start)
    }

    /// Total seconds covered by segments.
    pub fn covered(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(segments: &[(f64, f64)], anchor: Option<f64>) -> Timeline {
        Timeline {
            segments: segments.iter().map(|&s| s.into()).collect(),
            anchor,
        }
    }

    #[test]
    fn test_boundaries_include_anchor() {
        let t = timeline(&[(10.0, 20.0), (30.0, 40.0)], Some(25.0));
        assert_eq!(t.boundaries(), vec![10.0, 20.0, 25.0, 30.0, 40.0]);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let t = timeline(&[(10.0, 20.0)], None);
        assert!(t.contains(10.0));
        assert!(t.contains(20.0));
        assert!(!t.contains(20.5));
    }

    #[test]
    fn test_segment_at_prefers_later_on_shared_edge() {
        let t = timeline(&[(10.0, 20.0), (20.0, 30.0)], None);
        assert_eq!(t.segment_at(20.0), Some(1));
        assert_eq!(t.segment_at(15.0), Some(0));
        assert_eq!(t.segment_at(35.0), None);
    }

    #[test]
    fn test_consistency() {
        assert!(timeline(&[(10.0, 20.0), (20.0, 30.0)], None).is_consistent());
        assert!(!timeline(&[(10.0, 25.0), (20.0, 30.0)], None).is_consistent());
        assert!(!timeline(&[(20.0, 30.0), (0.0, 5.0)], None).is_consistent());
        assert_eq!(timeline(&[(0.0, 5.0), (10.0, 12.5)], None).covered(), 7.5);
    }
}
