//! Integration tests for frame index construction.
//!
//! Feeds captured ffprobe output through the builder, cache and background
//! job, then uses the result for snapping.

use cutmark_core::CutmarkError;
use cutmark_media::{
    CacheKey, FfprobeSource, InFlightBuilds, IndexCache, RecordedSource, TimestampIndex,
    TimestampIndexBuilder, ToolPaths,
};
use std::path::PathBuf;
use std::sync::Arc;

// ── Helpers ────────────────────────────────────────────────────

/// `ffprobe -show_packets` output for a short clip with B-frames and one
/// provisional timestamp right after the keyframe.
const PACKETS: &str = "\
[PACKET]
pts_time=0.000000
dts_time=N/A
flags=K_
[/PACKET]
[PACKET]
pts_time=0.001000
dts_time=N/A
flags=__
[/PACKET]
[PACKET]
pts_time=0.120000
dts_time=0.040000
flags=__
[/PACKET]
[PACKET]
pts_time=0.040000
dts_time=0.080000
flags=__
[/PACKET]
[PACKET]
pts_time=0.080000
dts_time=0.120000
flags=__
[/PACKET]
[PACKET]
pts_time=0.160000
dts_time=0.160000
flags=K_
[/PACKET]
";

const FRAMES: &str = "\
[FRAME]
best_effort_timestamp_time=0.000000
pict_type=I
[/FRAME]
[FRAME]
best_effort_timestamp_time=0.040000
pict_type=B
[/FRAME]
[FRAME]
best_effort_timestamp_time=0.080000
pict_type=P
[/FRAME]
";

fn media_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, vec![0u8; 2048]).unwrap();
    path
}

// ── Strategies ─────────────────────────────────────────────────

#[test]
fn packet_output_builds_clean_index() {
    let source = RecordedSource::from_packet_output(PACKETS);
    let index = TimestampIndexBuilder::new(Arc::new(source))
        .build(std::path::Path::new("clip.mp4"), &|_| {})
        .unwrap();

    assert_eq!(index.pts(), &[0.001, 0.04, 0.08, 0.12, 0.16]);
    assert_eq!(index.keyframes(), &[0.001, 0.16]);
}

#[test]
fn frame_output_is_the_fallback() {
    let mut source = RecordedSource::from_frame_output(FRAMES);
    source.packets = Some(Vec::new());
    let index = TimestampIndexBuilder::new(Arc::new(source))
        .build(std::path::Path::new("clip.mp4"), &|_| {})
        .unwrap();

    assert_eq!(index.pts(), &[0.0, 0.04, 0.08]);
    assert_eq!(index.keyframes(), &[0.0]);
}

/// Stand-in ffprobe that fails on packets and prints `FRAMES` for frames.
#[cfg(unix)]
fn frames_only_ffprobe(dir: &tempfile::TempDir) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.path().join("ffprobe");
    let body = format!(
        "#!/bin/sh\ncase \"$1\" in\n  -show_frames) cat <<'EOF'\n{FRAMES}EOF\n  ;;\n  *) exit 1 ;;\nesac\n"
    );
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn failing_packet_read_falls_back_to_frames() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let source = FfprobeSource::new(ToolPaths {
        ffmpeg: PathBuf::from("false"),
        ffprobe: frames_only_ffprobe(&dir),
    });

    let index = TimestampIndexBuilder::new(Arc::new(source))
        .build(&media, &|_| {})
        .unwrap();
    assert_eq!(index.pts(), &[0.0, 0.04, 0.08]);
    assert_eq!(index.keyframes(), &[0.0]);
}

#[cfg(unix)]
#[test]
fn missing_ffprobe_fails_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let source = FfprobeSource::new(ToolPaths {
        ffmpeg: PathBuf::from("false"),
        ffprobe: PathBuf::from("false"),
    });
    let result = TimestampIndexBuilder::new(Arc::new(source)).build(&media, &|_| {});
    assert!(matches!(result, Err(CutmarkError::IndexBuild(_))));
}

// ── Cache & background build ───────────────────────────────────

#[test]
fn background_build_fills_cache() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let cache = IndexCache::new(dir.path().join("cache"));

    let builder = Arc::new(
        TimestampIndexBuilder::new(Arc::new(RecordedSource::from_packet_output(PACKETS)))
            .with_cache(cache.clone()),
    );
    let in_flight = InFlightBuilds::new();
    let built = builder.spawn(media.clone(), &in_flight).unwrap().wait().unwrap();

    let key = CacheKey::for_file(&media).unwrap();
    assert_eq!(key.file_name(), "clip.mp4.2048.frames");
    assert_eq!(cache.read(&key).unwrap(), Some(built));
}

#[test]
fn concurrent_build_of_same_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let in_flight = InFlightBuilds::new();
    let _held = in_flight.acquire(CacheKey::for_file(&media).unwrap()).unwrap();

    let builder = Arc::new(TimestampIndexBuilder::new(Arc::new(
        RecordedSource::from_packet_output(PACKETS),
    )));
    let result = builder.spawn(media, &in_flight);
    assert!(matches!(result, Err(CutmarkError::BuildInProgress(_))));
}

#[test]
fn corrupt_cache_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let cache = IndexCache::new(dir.path());
    let key = CacheKey::for_file(&media).unwrap();
    std::fs::write(cache.entry_path(&key), b"[[0.0, 0.04]").unwrap();

    let index = TimestampIndexBuilder::new(Arc::new(RecordedSource::from_frame_output(FRAMES)))
        .with_cache(cache.clone())
        .build(&media, &|_| {})
        .unwrap();
    assert_eq!(index.pts().len(), 3);
    assert_eq!(cache.read(&key).unwrap(), Some(index));
}

#[test]
fn failed_build_leaves_snapping_off() {
    let dir = tempfile::tempdir().unwrap();
    let media = media_file(&dir);
    let result = TimestampIndexBuilder::new(Arc::new(RecordedSource::default()))
        .build(&media, &|_| {});
    assert!(matches!(result, Err(CutmarkError::IndexBuild(_))));

    let fallback = TimestampIndex::default();
    assert_eq!(fallback.snap(1.234, 0.04), 1.234);
}
