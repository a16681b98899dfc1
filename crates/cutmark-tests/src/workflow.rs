//! Integration tests for the edit-to-commands flow.
//!
//! Exercises cutmark-timeline editing and planning feeding the
//! cutmark-media command builder.

use cutmark_core::{Direction, EditMode, Segment};
use cutmark_media::{CutJob, EncodeMode, TimestampIndex, UserArgs};
use cutmark_timeline::{export_segments, next_anchor, next_keyframe, SegmentEditor};

const FD: f64 = 0.04;

// ── Helpers ────────────────────────────────────────────────────

/// Two minutes at 25 fps, keyframe every 2 s.
fn index() -> TimestampIndex {
    let pts = (0..=3000).map(|i| f64::from(i) * FD).collect();
    let keyframes = (0..=60).map(|i| f64::from(i) * 2.0).collect();
    TimestampIndex::new(pts, keyframes)
}

fn editor(picks: &[f64]) -> SegmentEditor {
    let mut editor = SegmentEditor::new();
    for &p in picks {
        editor.put_anchor(p, true);
    }
    editor
}

fn pairs(segments: &[Segment]) -> Vec<(f64, f64)> {
    segments.iter().map(|&s| s.into()).collect()
}

// ── Editing & navigation ───────────────────────────────────────

#[test]
fn keyframe_jumps_bracket_a_pick() {
    let index = index();
    let start = next_keyframe(&index, 11.3, FD, Direction::Backward).unwrap();
    let end = next_keyframe(&index, 11.3, FD, Direction::Forward).unwrap();
    assert_eq!((start, end), (10.0, 12.0));

    let e = editor(&[start, end]);
    assert_eq!(pairs(e.timeline().segments()), vec![(10.0, 12.0)]);
}

#[test]
fn anchor_jumps_walk_all_boundaries() {
    let e = editor(&[10.0, 20.0, 30.0, 40.0, 50.0]);
    let mut position = 0.0;
    let mut visited = Vec::new();
    while let Some(next) = next_anchor(e.timeline(), position, Direction::Forward) {
        visited.push(next);
        position = next;
    }
    assert_eq!(visited, vec![10.0, 20.0, 30.0, 40.0, 50.0]);
}

#[test]
fn redraw_after_deleting_an_edge() {
    let mut e = editor(&[10.0, 20.0]);
    let target = e.closest_anchor(10.4).unwrap();
    e.del_anchor(target);
    e.put_anchor(12.0, true);
    assert_eq!(pairs(e.timeline().segments()), vec![(12.0, 20.0)]);
}

// ── Export planning ────────────────────────────────────────────

#[test]
fn keep_mode_copy_commands() {
    let e = editor(&[10.0, 20.0, 50.0, 60.0]);
    let segments = export_segments(e.timeline(), EditMode::Keep, 120.0, &index(), FD);
    assert_eq!(pairs(&segments), vec![(10.0, 20.04), (50.0, 60.04)]);

    let user = UserArgs::parse("out: /out/cut.mp4\n");
    let job = CutJob::new("ffmpeg", "/in/movie.mp4", &user, EncodeMode::Copy, "/tmp/work");
    let plan = job.plan(&segments).unwrap();

    assert_eq!(plan.parts.len(), 2);
    assert_eq!(plan.invocations().count(), 2);
    let args = plan.encode[0].args.join(" ");
    assert!(args.contains("-ss 10 -to 20.04 -c copy /out/cut.part000.mp4"), "{args}");
    assert!(args.contains("-ss 50 -to 60.04 -c copy /out/cut.part001.mp4"), "{args}");
    assert_eq!(plan.concat.args.last().map(String::as_str), Some("/out/cut.mp4"));
}

#[test]
fn remove_mode_cuts_the_gaps() {
    let e = editor(&[10.0, 20.0, 50.0, 60.0]);
    let segments = export_segments(e.timeline(), EditMode::Remove, 120.0, &index(), FD);
    assert_eq!(
        pairs(&segments),
        vec![(0.04, 10.0), (20.04, 50.0), (60.04, 120.0)]
    );
}

#[test]
fn remove_mode_from_first_to_last_frame() {
    let e = editor(&[0.0, 10.0, 110.0, 120.0]);
    let segments = export_segments(e.timeline(), EditMode::Remove, 120.0, &index(), FD);
    assert_eq!(pairs(&segments), vec![(10.04, 110.0)]);
}

#[test]
fn plan_is_rerunnable() {
    let e = editor(&[1.0, 2.0]);
    let segments = export_segments(e.timeline(), EditMode::Keep, 120.0, &index(), FD);
    let job = CutJob::new(
        "ffmpeg",
        "/in/a.mkv",
        &UserArgs::default(),
        EncodeMode::TwoPass,
        "/tmp/work",
    );
    let first = job.plan(&segments).unwrap();
    let second = job.plan(&segments).unwrap();
    assert_eq!(first.encode, second.encode);
    assert_eq!(first.list_contents, second.list_contents);
}
