//! Integration tests for saved editing state.

use cutmark_core::{EditMode, Segment};
use cutmark_media::EncodeMode;
use cutmark_timeline::{EditSettings, SavedState, SegmentEditor};
use proptest::prelude::*;

#[test]
fn state_written_by_hand_is_replayed() {
    let json = br#"{
 "2-pass": false,
 "anchor": 42.5,
 "encode": true,
 "ffargs": "out: trimmed.mkv\nout-args: -c:v libx265",
 "mode": "remove",
 "segments": [[3.2, 7.9], [12.0, 30.0]]
}"#;
    let state = SavedState::from_json(json).unwrap();
    let mut editor = SegmentEditor::new();
    editor.restore(&state);

    assert_eq!(
        editor.timeline().segments(),
        &[Segment::new(3.2, 7.9), Segment::new(12.0, 30.0)]
    );
    assert_eq!(editor.timeline().anchor(), Some(42.5));
    assert_eq!(state.settings.mode, EditMode::Remove);
    assert_eq!(state.settings.encode_mode(), EncodeMode::Encode);
    assert_eq!(state.settings.user_args().out_args, vec!["-c:v", "libx265"]);
}

#[test]
fn edits_survive_a_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movie.mkv.cutmark");

    let mut editor = SegmentEditor::new();
    for pick in [5.0, 10.0, 20.0, 25.0, 7.0, 22.0] {
        editor.put_anchor(pick, true);
    }
    editor.put_anchor(40.0, true);
    let settings = EditSettings {
        mode: EditMode::Keep,
        ..Default::default()
    };
    SavedState::capture(&editor, &settings)
        .save_to_file(&path)
        .unwrap();

    let mut reopened = SegmentEditor::new();
    reopened.restore(&SavedState::load_from_file(&path).unwrap());
    assert_eq!(reopened.timeline(), editor.timeline());
    assert_eq!(
        reopened.timeline().segments(),
        &[Segment::new(5.0, 25.0)]
    );
    assert_eq!(reopened.timeline().anchor(), Some(40.0));
}

#[test]
fn zero_width_pick_inside_segment_survives_reload() {
    let mut editor = SegmentEditor::new();
    for pick in [10.0, 20.0, 15.0, 15.0] {
        editor.put_anchor(pick, true);
    }
    assert_eq!(editor.timeline().segments(), &[Segment::new(10.0, 20.0)]);

    let json = SavedState::capture(&editor, &EditSettings::default())
        .to_json()
        .unwrap();
    let mut restored = SegmentEditor::new();
    restored.restore(&SavedState::from_json(&json).unwrap());
    assert_eq!(restored.timeline(), editor.timeline());
}

proptest! {
    #[test]
    fn capture_then_restore_is_identity(picks in prop::collection::vec(0u32..400, 0..40)) {
        let mut editor = SegmentEditor::new();
        for p in picks {
            editor.put_anchor(f64::from(p) / 4.0, true);
        }

        let state = SavedState::capture(&editor, &EditSettings::default());
        let json = state.to_json().unwrap();
        let mut restored = SegmentEditor::new();
        restored.restore(&SavedState::from_json(&json).unwrap());
        prop_assert_eq!(restored.timeline(), editor.timeline());
    }
}
