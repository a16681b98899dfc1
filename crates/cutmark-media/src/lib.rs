//! Cutmark Media - frame timestamp indexing and FFmpeg integration
//!
//! This crate handles:
//! - Extracting packet and frame timing with ffprobe
//! - Building, caching and normalizing the frame timestamp index
//! - Media file probing
//! - Generating and running the FFmpeg cut commands

pub mod builder;
pub mod cache;
pub mod export;
pub mod index;
pub mod probe;
pub mod source;
pub mod strategy;
pub mod tools;

pub use builder::{InFlightBuilds, InFlightGuard, IndexJob, TimestampIndexBuilder};
pub use cache::{CacheKey, IndexCache};
pub use export::{CutCancel, CutJob, CutPlan, EncodeMode, Invocation, UserArgs};
pub use index::{remove_incomplete_packets, TimestampIndex};
pub use probe::{check_copy_seek, MediaProbe, SeekAccuracy};
pub use source::{FfprobeSource, FrameRecord, MetadataSource, PacketRecord, RecordedSource};
pub use strategy::{default_strategies, FrameStrategy, IndexProgress, IndexStrategy, PacketStrategy};
pub use tools::ToolPaths;
