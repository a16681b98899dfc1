//! Frame timestamp index.
//!
//! Holds every presentation timestamp of the video stream plus the subset
//! that are keyframes. Built once per file, then shared read-only.

use cutmark_core::search;
use cutmark_core::tolerances::{INCOMPLETE_PACKET_JITTER, INCOMPLETE_PACKET_WINDOW};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;

/// Ascending, duplicate-free frame and keyframe timestamps (seconds).
///
/// Serialized as `[[pts...], [keyframes...]]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampIndex {
    pts: Vec<f64>,
    keyframes: Vec<f64>,
}

impl TimestampIndex {
    /// Build an index, sorting and deduplicating both sequences.
    ///
    /// Negative and non-finite values are discarded.
    pub fn new(pts: Vec<f64>, keyframes: Vec<f64>) -> Self {
        Self {
            pts: normalize(pts),
            keyframes: normalize(keyframes),
        }
    }

    /// All frame timestamps, ascending.
    pub fn pts(&self) -> &[f64] {
        &self.pts
    }

    /// Keyframe timestamps, ascending.
    pub fn keyframes(&self) -> &[f64] {
        &self.keyframes
    }

    /// True when no frame timestamps are known.
    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    pub fn has_keyframes(&self) -> bool {
        !self.keyframes.is_empty()
    }

    pub fn first_pts(&self) -> Option<f64> {
        self.pts.first().copied()
    }

    pub fn last_pts(&self) -> Option<f64> {
        self.pts.last().copied()
    }

    /// Nearest frame timestamp, regardless of distance.
    pub fn closest_pts(&self, t: f64) -> Option<f64> {
        search::closest(t, &self.pts, None)
    }

    /// Replace `t` with the nearest frame timestamp strictly within `tolerance`.
    ///
    /// Returns `t` unchanged when the index is empty or nothing is close enough.
    pub fn snap(&self, t: f64, tolerance: f64) -> f64 {
        search::closest(t, &self.pts, Some(tolerance)).unwrap_or(t)
    }

    /// True if `t` is nearer to the first frame than to any other.
    pub fn is_first_frame(&self, t: f64) -> bool {
        matches!((self.closest_pts(t), self.first_pts()), (Some(c), Some(f)) if c == f)
    }

    /// True if `t` is nearer to the last frame than to any other.
    pub fn is_last_frame(&self, t: f64) -> bool {
        matches!((self.closest_pts(t), self.last_pts()), (Some(c), Some(l)) if c == l)
    }
}

impl Serialize for TimestampIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.pts, &self.keyframes).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TimestampIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (pts, keyframes) = <(Vec<f64>, Vec<f64>)>::deserialize(deserializer)?;
        Ok(Self::new(pts, keyframes))
    }
}

fn normalize(mut values: Vec<f64>) -> Vec<f64> {
    values.retain(|v| v.is_finite() && *v >= 0.0);
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Drop provisional timestamps emitted for incomplete packets.
///
/// Some containers report a provisional and a corrected timestamp for the
/// same frame a millisecond or two apart. Walking `pts` in ascending order,
/// any of the last [`INCOMPLETE_PACKET_WINDOW`] timestamps within
/// [`INCOMPLETE_PACKET_JITTER`] of the current one is removed, and a keyframe
/// pointing at it is moved to the surviving timestamp.
///
/// `pts` and `keyframes` must be sorted and deduplicated. Returns the number
/// of removed timestamps.
pub fn remove_incomplete_packets(pts: &mut Vec<f64>, keyframes: &mut Vec<f64>) -> usize {
    let mut window: VecDeque<usize> = VecDeque::with_capacity(INCOMPLETE_PACKET_WINDOW);
    let mut removed = vec![false; pts.len()];
    let mut removed_count = 0;

    for (i, &t) in pts.iter().enumerate() {
        window.retain(|&j| {
            let v = pts[j];
            if (v - t).abs() > INCOMPLETE_PACKET_JITTER {
                return true;
            }
            removed[j] = true;
            removed_count += 1;
            if let Some(k) = keyframes.iter().position(|&k| k == v) {
                keyframes[k] = t;
            }
            false
        });

        if window.len() == INCOMPLETE_PACKET_WINDOW {
            window.pop_front();
        }
        window.push_back(i);
    }

    if removed_count > 0 {
        let mut flags = removed.into_iter();
        pts.retain(|_| !flags.next().unwrap_or(false));
        keyframes.sort_by(f64::total_cmp);
        keyframes.dedup();
    }
    removed_count
}
