//! Nearest-neighbor lookups over ascending timestamp sequences.
//!
//! Used for anchor navigation, keyframe navigation and boundary snapping.
//! All functions expect `sorted` to be ascending; they never panic on empty input.

/// Navigation direction along the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    /// Pick the neighbor for this direction out of a `(left, right)` pair.
    #[inline]
    pub fn pick<T>(self, sides: (Option<T>, Option<T>)) -> Option<T> {
        match self {
            Self::Backward => sides.0,
            Self::Forward => sides.1,
        }
    }
}

/// Indices of the nearest strict neighbors of `target` on each side.
///
/// A candidate qualifies on the left when `target - v >= min_diff` and on the
/// right when `v - target >= min_diff`; a candidate equal to `target` never
/// qualifies. Candidates farther than `max_diff` are skipped and the scan
/// continues outward.
///
/// ```
/// use cutmark_core::search::sidesi;
/// assert_eq!(sidesi(5.0, &[3.0, 4.0, 5.0, 6.0], 0.0, None), (Some(1), Some(3)));
/// ```
pub fn sidesi(
    target: f64,
    sorted: &[f64],
    min_diff: f64,
    max_diff: Option<f64>,
) -> (Option<usize>, Option<usize>) {
    if sorted.is_empty() {
        return (None, None);
    }

    let qualifies = |d: f64| d != 0.0 && min_diff <= d && max_diff.map_or(true, |max| d <= max);

    // First index whose value is >= target.
    let split = sorted.partition_point(|&v| v < target);

    let right = sorted[split..]
        .iter()
        .position(|&v| qualifies(v - target))
        .map(|i| split + i);

    let left = sorted[..split]
        .iter()
        .rposition(|&v| qualifies(target - v));

    (left, right)
}

/// Values of the nearest strict neighbors, see [`sidesi`].
pub fn sides(
    target: f64,
    sorted: &[f64],
    min_diff: f64,
    max_diff: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let (left, right) = sidesi(target, sorted, min_diff, max_diff);
    (left.map(|i| sorted[i]), right.map(|i| sorted[i]))
}

/// Index of the value nearest to `target`. Ties go to the lower value.
pub fn closest_index(target: f64, sorted: &[f64]) -> Option<usize> {
    if sorted.is_empty() {
        return None;
    }
    let split = sorted.partition_point(|&v| v < target);
    if split == 0 {
        return Some(0);
    }
    if split == sorted.len() {
        return Some(split - 1);
    }
    let below = target - sorted[split - 1];
    let above = sorted[split] - target;
    if above < below {
        Some(split)
    } else {
        Some(split - 1)
    }
}

/// The value nearest to `target`, only if strictly closer than `max_diff`.
pub fn closest(target: f64, sorted: &[f64], max_diff: Option<f64>) -> Option<f64> {
    let value = sorted[closest_index(target, sorted)?];
    match max_diff {
        Some(max) if (value - target).abs() >= max => None,
        _ => Some(value),
    }
}
