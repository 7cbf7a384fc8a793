use tensegrity_import_core::{
    compute_windows, emit, import_json, parse_animation_json, EmitMode, FrameSelection,
    ImportConfig, ImportError, ImportEvent, Importer, ObjectKind,
};

const ID: &str = "[1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]";

fn record(name: &str) -> String {
    format!(r#"{{"name":"{name}","matrix":{ID}}}"#)
}

/// Build a document from per-frame (joints, pushes) name lists.
fn document(frames: &[(&[&str], &[&str])]) -> String {
    let frames: Vec<String> = frames
        .iter()
        .map(|(joints, pushes)| {
            let joints: Vec<String> = joints.iter().map(|n| record(n)).collect();
            let pushes: Vec<String> = pushes.iter().map(|n| record(n)).collect();
            format!(
                r#"{{"joints":[{}],"intervals":{{"push":[{}]}}}}"#,
                joints.join(","),
                pushes.join(",")
            )
        })
        .collect();
    format!(r#"{{"fps":24,"frames":[{}]}}"#, frames.join(","))
}

fn visibility_of(events: &[ImportEvent], who: &str) -> Vec<(usize, bool)> {
    events
        .iter()
        .filter_map(|e| match e {
            ImportEvent::SetVisibility {
                name,
                frame_index,
                visible,
                ..
            } if name == who => Some((*frame_index, *visible)),
            _ => None,
        })
        .collect()
}

fn transform_frames(events: &[ImportEvent], who: &str) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            ImportEvent::SetTransform {
                name, frame_index, ..
            } if name == who => Some(*frame_index),
            _ => None,
        })
        .collect()
}

#[test]
fn single_frame_single_joint() {
    let json = document(&[(&["J1"], &[])]);
    let out = import_json(&json, &ImportConfig::default()).unwrap();
    assert_eq!(out.events.len(), 2);
    assert!(matches!(&out.events[0], ImportEvent::CreateEntity { name, .. } if name == "J1"));
    assert_eq!(transform_frames(&out.events, "J1"), [1]);
    assert!(!out.report.is_animation);
}

#[test]
fn push_present_only_in_the_middle_frame() {
    let json = document(&[(&["J1"], &[]), (&["J1"], &["P1"]), (&["J1"], &[])]);
    let out = import_json(&json, &ImportConfig::construction()).unwrap();
    assert_eq!(visibility_of(&out.events, "P1"), [(1, false), (2, true), (3, false)]);
    assert_eq!(transform_frames(&out.events, "P1"), [2]);
    assert_eq!(visibility_of(&out.events, "J1"), [(1, true)]);
    assert_eq!(transform_frames(&out.events, "J1"), [1, 2, 3]);
}

#[test]
fn entity_keys_are_confined_to_its_window() {
    let json = document(&[
        (&["J1"], &[]),
        (&["J1", "J2"], &["P1"]),
        (&["J2"], &["P1"]),
        (&["J2"], &[]),
    ]);
    let out = import_json(&json, &ImportConfig::construction()).unwrap();
    assert_eq!(transform_frames(&out.events, "J1"), [1, 2]);
    assert_eq!(visibility_of(&out.events, "J1"), [(1, true), (3, false)]);
    assert_eq!(transform_frames(&out.events, "J2"), [2, 3, 4]);
    assert_eq!(visibility_of(&out.events, "J2"), [(1, false), (2, true)]);
    assert_eq!(transform_frames(&out.events, "P1"), [2, 3]);
}

#[test]
fn entity_transform_count_equals_window_coverage() {
    let json = document(&[
        (&["J1", "J2"], &[]),
        (&["J2"], &["P1"]),
        (&["J1"], &["P1", "P2"]),
        (&["J1", "J3"], &[]),
        (&["J3"], &["P2"]),
    ])
    .replace(
        r#"{"joints":"#,
        r#"{"camera":{"position":[0,-5,1],"target":[0,0,0]},"joints":"#,
    );
    let anim = parse_animation_json(&json).unwrap();
    assert!(anim.frames.iter().all(|f| f.camera.is_some()));
    let windows = compute_windows(&anim.frames);
    let coverage: usize = windows.values().map(|w| w.frame_count()).sum();

    let events = emit(&anim.frames, Some(&windows), EmitMode::Construction).unwrap();
    let entity_transforms = events
        .iter()
        .filter(|e| {
            matches!(e, ImportEvent::SetTransform { kind, .. } if *kind != ObjectKind::Camera)
        })
        .count();
    assert_eq!(entity_transforms, coverage);

    // The camera is keyed on every frame after its creation frame, outside any window.
    let camera_transforms = events
        .iter()
        .filter(|e| matches!(e, ImportEvent::SetTransform { kind: ObjectKind::Camera, .. }))
        .count();
    assert_eq!(camera_transforms, anim.frames.len() - 1);

    let creates = events
        .iter()
        .filter(|e| matches!(e, ImportEvent::CreateEntity { .. }))
        .count();
    assert_eq!(creates, windows.len());
}

#[test]
fn every_object_is_created_before_it_is_keyed() {
    let json = document(&[(&["J1"], &[]), (&["J1", "J2"], &["P1"]), (&["J2"], &[])]);
    for config in [ImportConfig::default(), ImportConfig::construction()] {
        let out = import_json(&json, &config).unwrap();
        let mut created: Vec<&str> = Vec::new();
        for event in &out.events {
            match event {
                ImportEvent::CreateEntity { name, .. } => created.push(name),
                ImportEvent::SetTransform { name, .. } | ImportEvent::SetVisibility { name, .. } => {
                    assert!(created.contains(&name.as_str()), "{name} keyed before creation")
                }
                ImportEvent::CreateCamera { .. } => {}
            }
        }
    }
}

#[test]
fn repeated_imports_are_identical() {
    let json = document(&[(&["J3", "J1"], &["P2"]), (&["J1", "J2"], &["P1", "P2"]), (&["J2"], &[])]);
    let config = ImportConfig::construction();
    let first = import_json(&json, &config).unwrap();
    let second = import_json(&json, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.events).unwrap(),
        serde_json::to_string(&second.events).unwrap()
    );
}

#[test]
fn single_frame_selection_imports_a_static_pose() {
    let json = document(&[(&["J1"], &[]), (&["J1", "J2"], &["P1"]), (&["J2"], &[])]);
    let config = ImportConfig {
        construction_mode: true,
        frame_selection: FrameSelection::Single { index: 1 },
        ..ImportConfig::default()
    };
    let out = Importer::new(config).import_str(&json).unwrap();
    assert_eq!(out.report.mode, EmitMode::Plain);
    assert_eq!((out.report.frame_start, out.report.frame_end), (1, 1));
    assert_eq!(out.report.created.total(), 3);
    assert!(out
        .events
        .iter()
        .all(|e| !matches!(e, ImportEvent::SetVisibility { .. })));
}

#[test]
fn same_name_in_different_kinds_are_distinct_objects() {
    let json = document(&[(&["A"], &["A"]), (&["A"], &[])]);
    let out = import_json(&json, &ImportConfig::construction()).unwrap();
    let push_keys: Vec<usize> = out
        .events
        .iter()
        .filter_map(|e| match e {
            ImportEvent::SetTransform {
                kind: ObjectKind::Push,
                frame_index,
                ..
            } => Some(*frame_index),
            _ => None,
        })
        .collect();
    assert_eq!(push_keys, [1]);
    assert_eq!(out.report.created.total(), 2);
}

#[test]
fn errors_abort_without_events() {
    let cases = [
        (r#"{"frames": [ {"joints": [ {"matrix": [1]} ]} ]}"#, "schema"),
        ("{ not json", "parse"),
        (r#"{"fps": 24, "frames": []}"#, "empty"),
        (
            r#"{"frames": [ {"joints": [ {"name":"J1","matrix":[0,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]} ]} ]}"#,
            "validation",
        ),
        (
            r#"{"frames": [ {"joints": [ {"name":"J1","matrix":[-1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]} ]} ]}"#,
            "validation",
        ),
    ];
    for (json, category) in cases {
        let err = import_json(json, &ImportConfig::default()).unwrap_err();
        assert_eq!(err.category(), category, "{json}: {err}");
    }
}

#[test]
fn missing_name_reports_its_location() {
    let json = format!(r#"{{"frames":[{{}},{{"intervals":{{"pull":[{},{{"matrix":{ID}}}]}}}}]}}"#, record("L1"));
    let err = import_json(&json, &ImportConfig::default()).unwrap_err();
    assert_eq!(
        err,
        ImportError::MissingField {
            frame: 2,
            record: "intervals.pull[1]".into(),
            field: "name".into(),
        }
    );
}
