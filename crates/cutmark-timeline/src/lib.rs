//! Cutmark Timeline - segment editing engine
//!
//! Implements the editing side of cutmark:
//! - Timeline of non-overlapping segments with one pending anchor
//! - Anchor-based insert, split, extend, join and delete
//! - Anchor and keyframe navigation
//! - Inversion and frame snapping of segments for export
//! - Saved editing state

pub mod editor;
pub mod navigation;
pub mod plan;
pub mod state;
pub mod timeline;

pub use editor::{DelOutcome, PutOutcome, SegmentEditor};
pub use navigation::{next_anchor, next_keyframe};
pub use plan::{adjust, export_segments, invert};
pub use state::{default_save_path, EditSettings, SavedState};
pub use timeline::Timeline;
