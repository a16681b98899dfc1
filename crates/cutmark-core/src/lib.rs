//! Cutmark Core - Foundation types for segment cutting
//!
//! This crate provides the types shared by the index builder, the editor
//! and the exporter:
//! - Time helpers (FrameRate, millisecond rounding, time formatting)
//! - Segments and the keep/remove edit mode
//! - Nearest-neighbor search over ascending timestamps

pub mod error;
pub mod search;
pub mod segment;
pub mod time;

pub use error::{CutmarkError, Result};
pub use search::{closest, closest_index, sides, sidesi, Direction};
pub use segment::{EditMode, Segment};
pub use time::{format_time, parse_time, round_ms, FrameRate};

/// Tolerances used when cleaning up packet timestamps.
pub mod tolerances {
    /// Two packet timestamps closer than this are treated as one frame (seconds).
    pub const INCOMPLETE_PACKET_JITTER: f64 = 0.002;

    /// Number of recent timestamps checked for incomplete-packet duplicates.
    pub const INCOMPLETE_PACKET_WINDOW: usize = 10;
}
