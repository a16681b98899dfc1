//! Index construction strategies.
//!
//! [`PacketStrategy`] reads packet metadata only and is cheap;
//! [`FrameStrategy`] decodes every frame and serves as the fallback.

use cutmark_core::Result;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::index::{remove_incomplete_packets, TimestampIndex};
use crate::source::MetadataSource;

/// How often frame decoding reports progress.
const PROGRESS_EVERY: u64 = 100;

/// Frame decoding progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    /// Frames processed so far.
    pub processed: u64,
    /// Total frames, if a dry run could count them.
    pub total: Option<u64>,
}

impl IndexProgress {
    /// Completion fraction (0.0 to 1.0), if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) | None => None,
            Some(total) => Some((self.processed as f64 / total as f64).min(1.0)),
        }
    }
}

impl fmt::Display for IndexProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.total, self.fraction()) {
            (Some(total), Some(fraction)) => write!(
                f,
                "Processed: {}/{} ({}%)",
                self.processed,
                total,
                (fraction * 100.0) as u32
            ),
            _ => write!(f, "Processed: {}/?", self.processed),
        }
    }
}

/// One way of turning extracted metadata into a [`TimestampIndex`].
pub trait IndexStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Collect timestamps. `Ok(None)` means the strategy found nothing.
    fn collect(
        &self,
        source: &dyn MetadataSource,
        path: &Path,
        progress: &dyn Fn(IndexProgress),
    ) -> Result<Option<TimestampIndex>>;
}

/// Packet mode: merge packet pts and dts, keyframes from packet flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketStrategy;

impl IndexStrategy for PacketStrategy {
    fn name(&self) -> &'static str {
        "packets"
    }

    fn collect(
        &self,
        source: &dyn MetadataSource,
        path: &Path,
        _progress: &dyn Fn(IndexProgress),
    ) -> Result<Option<TimestampIndex>> {
        let mut pts = Vec::new();
        let mut keyframes = Vec::new();

        source.read_packets(path, &mut |packet| {
            pts.extend(packet.pts);
            pts.extend(packet.dts);
            if packet.keyframe {
                // Prefer pts, some packets only carry a dts.
                keyframes.extend(packet.pts.or(packet.dts));
            }
        })?;

        if pts.is_empty() {
            return Ok(None);
        }

        let index = TimestampIndex::new(pts, keyframes);
        let (mut pts, mut keyframes) = (index.pts().to_vec(), index.keyframes().to_vec());
        let removed = remove_incomplete_packets(&mut pts, &mut keyframes);
        if removed > 0 {
            debug!("Dropped {} incomplete packet timestamps", removed);
        }

        Ok(Some(TimestampIndex::new(pts, keyframes)))
    }
}

/// Frame mode: decode every frame, keyframes are I pictures.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStrategy;

impl IndexStrategy for FrameStrategy {
    fn name(&self) -> &'static str {
        "frames"
    }

    fn collect(
        &self,
        source: &dyn MetadataSource,
        path: &Path,
        progress: &dyn Fn(IndexProgress),
    ) -> Result<Option<TimestampIndex>> {
        let total = source.frame_count_hint(path);
        info!(
            "Decoding frames of {} ({} expected)",
            path.display(),
            total.map_or_else(|| "?".to_string(), |t| t.to_string())
        );

        let mut processed = 0u64;
        let mut pts = Vec::new();
        let mut keyframes = Vec::new();
        let mut last = None;

        source.read_frames(path, &mut |frame| {
            if let Some(t) = frame.timestamp {
                pts.push(t);
                last = Some(t);
            }
            if frame.is_keyframe() {
                keyframes.extend(frame.timestamp.or(last));
            }
            processed += 1;
            if processed % PROGRESS_EVERY == 0 {
                progress(IndexProgress { processed, total });
            }
        })?;
        progress(IndexProgress { processed, total });

        if pts.is_empty() {
            return Ok(None);
        }
        Ok(Some(TimestampIndex::new(pts, keyframes)))
    }
}

/// The default fallback chain: packets first, then full decode.
pub fn default_strategies() -> Vec<Box<dyn IndexStrategy>> {
    vec![Box::new(PacketStrategy), Box::new(FrameStrategy)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FrameRecord, PacketRecord, RecordedSource};
    use std::cell::RefCell;

    fn packet(pts: Option<f64>, dts: Option<f64>, keyframe: bool) -> PacketRecord {
        PacketRecord { pts, dts, keyframe }
    }

    fn frame(t: f64, picture_type: char) -> FrameRecord {
        FrameRecord {
            timestamp: Some(t),
            picture_type: Some(picture_type),
        }
    }

    #[test]
    fn test_progress_display() {
        let known = IndexProgress {
            processed: 50,
            total: Some(200),
        };
        assert_eq!(known.to_string(), "Processed: 50/200 (25%)");
        assert_eq!(known.fraction(), Some(0.25));

        let unknown = IndexProgress {
            processed: 7,
            total: None,
        };
        assert_eq!(unknown.to_string(), "Processed: 7/?");
        assert_eq!(unknown.fraction(), None);
    }

    #[test]
    fn test_packets_merge_pts_and_dts() {
        let source = RecordedSource {
            packets: Some(vec![
                packet(Some(0.0), None, true),
                packet(Some(0.12), Some(0.04), false),
                packet(Some(0.04), Some(0.08), false),
                packet(None, Some(0.16), true),
            ]),
            ..Default::default()
        };
        let index = PacketStrategy
            .collect(&source, Path::new("a.mp4"), &|_| {})
            .unwrap()
            .unwrap();
        assert_eq!(index.pts(), &[0.0, 0.04, 0.08, 0.12, 0.16]);
        assert_eq!(index.keyframes(), &[0.0, 0.16]);
    }

    #[test]
    fn test_packets_drop_incomplete_duplicates() {
        let source = RecordedSource {
            packets: Some(vec![
                packet(Some(1.0), None, true),
                packet(Some(1.0015), None, false),
                packet(Some(2.0), None, false),
            ]),
            ..Default::default()
        };
        let index = PacketStrategy
            .collect(&source, Path::new("a.mkv"), &|_| {})
            .unwrap()
            .unwrap();
        assert_eq!(index.pts(), &[1.0015, 2.0]);
        assert_eq!(index.keyframes(), &[1.0015]);
    }

    #[test]
    fn test_packets_empty_is_no_result() {
        let source = RecordedSource {
            packets: Some(vec![packet(None, None, true)]),
            ..Default::default()
        };
        let result = PacketStrategy.collect(&source, Path::new("a.mkv"), &|_| {});
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_frames_with_progress() {
        let frames: Vec<FrameRecord> = (0..250)
            .map(|i| frame(i as f64 * 0.04, if i % 50 == 0 { 'I' } else { 'P' }))
            .collect();
        let source = RecordedSource {
            frames: Some(frames),
            frame_count: Some(250),
            ..Default::default()
        };

        let seen = RefCell::new(Vec::new());
        let index = FrameStrategy
            .collect(&source, Path::new("a.mp4"), &|p| seen.borrow_mut().push(p))
            .unwrap()
            .unwrap();

        assert_eq!(index.pts().len(), 250);
        assert_eq!(index.keyframes().len(), 5);
        let seen = seen.into_inner();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last().unwrap().processed, 250);
        assert_eq!(seen.last().unwrap().total, Some(250));
    }

    #[test]
    fn test_frames_keyframe_without_timestamp_uses_previous() {
        let source = RecordedSource {
            frames: Some(vec![
                frame(0.0, 'P'),
                FrameRecord {
                    timestamp: None,
                    picture_type: Some('I'),
                },
            ]),
            ..Default::default()
        };
        let index = FrameStrategy
            .collect(&source, Path::new("a.mp4"), &|_| {})
            .unwrap()
            .unwrap();
        assert_eq!(index.keyframes(), &[0.0]);
    }
}
