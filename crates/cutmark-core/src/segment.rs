//! Segment and edit mode types shared by the editor and the exporter.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::round_ms;

/// A committed `(start, end)` interval in seconds, `start < end`.
///
/// Serialized as a two element array `[start, end]`, which is the form
/// used by the saved editing state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    /// Create a segment from two boundaries in either order.
    #[inline]
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Length in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Zero-length segments are never committed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Inclusive containment: `start <= t <= end`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t <= self.end
    }

    /// True if the whole segment lies within `[lo, hi]`.
    #[inline]
    pub fn within(&self, lo: f64, hi: f64) -> bool {
        self.start >= lo && self.end <= hi
    }

    /// True if the two segments share more than a boundary.
    #[inline]
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `t` is exactly one of the two boundaries.
    #[inline]
    pub fn has_boundary(&self, t: f64) -> bool {
        self.start == t || self.end == t
    }

    /// Both boundaries rounded to milliseconds.
    pub fn rounded(&self) -> Self {
        Self {
            start: round_ms(self.start),
            end: round_ms(self.end),
        }
    }
}

impl From<(f64, f64)> for Segment {
    fn from((start, end): (f64, f64)) -> Self {
        Self::new(start, end)
    }
}

impl From<Segment> for (f64, f64) {
    fn from(segment: Segment) -> Self {
        (segment.start, segment.end)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}-{:.3}", self.start, self.end)
    }
}

/// Whether timeline segments mark footage to keep or to cut out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Keep,
    Remove,
}

impl EditMode {
    pub fn is_keep(self) -> bool {
        self == Self::Keep
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("keep"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

impl std::str::FromStr for EditMode {
    type Err = crate::error::CutmarkError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "keep" => Ok(Self::Keep),
            "remove" => Ok(Self::Remove),
            other => Err(crate::error::CutmarkError::InvalidParameter(format!(
                "Unknown mode: {other}"
            ))),
        }
    }
}
