use json_patch_vm::{json_io, Patch, RuntimeError};

#[test]
fn parse_from_text() {
    let patch = Patch::from_json_text(
        r#"[{"op": "add", "path": "/a/b", "value": 1}, {"op": "remove", "path": "/c"}]"#,
    )
    .unwrap();
    assert_eq!(
        json_io::render_text(&patch.to_json_array()),
        r#"[{"op":"add","path":"/a/b","value":1},{"op":"remove","path":"/c"}]"#
    );
}

#[test]
fn serialize_round_trips_arbitrary_field_order() {
    let s = r#"[{"op":"replace","path":"/x","value":[1,2,3]}]"#;
    let patch = Patch::from_json_text(s).unwrap();
    assert_eq!(json_io::render_text(&patch.to_json_array()), s);
}

#[test]
fn core_ops_add_remove_replace_move_copy_test() {
    let mut doc = json_io::parse_text(r#"{"a": {"b": 1}, "c": 2}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "test", "path": "/a/b", "value": 1},
            {"op": "replace", "path": "/c", "value": 3},
            {"op": "copy", "from": "/a", "path": "/d"},
            {"op": "move", "from": "/a/b", "path": "/e"},
            {"op": "remove", "path": "/d/b"}
        ]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(
        json_io::render_text(&doc),
        r#"{"a":{},"c":3,"d":{},"e":1}"#
    );
}

#[test]
fn test_failure_reports_expected_and_found() {
    let mut doc = json_io::parse_text(r#"{"a": 1}"#).unwrap();
    let patch = Patch::from_json_text(r#"[{"op": "test", "path": "/a", "value": 2}]"#).unwrap();
    let err = patch.apply(&mut doc).unwrap_err();
    match err {
        RuntimeError::TestFailed { pointer, expected, found } => {
            assert_eq!(pointer, "/a");
            assert_eq!(expected, "2");
            assert_eq!(found, "1");
        }
        other => panic!("expected TestFailed, got {other:?}"),
    }
}

#[test]
fn array_append_token_and_index_insertion() {
    let mut doc = json_io::parse_text(r#"{"items": [1, 2]}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "add", "path": "/items/-", "value": 3},
            {"op": "add", "path": "/items/0", "value": 0}
        ]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"items":[0,1,2,3]}"#);
}

#[test]
fn relation_and_arithmetic_opcodes_compose() {
    // `number/add` writes its result via remove-then-add (so the write
    // always replaces, even onto an array position); for an object, that
    // moves the key to the end, matching the original VM's behavior.
    let mut doc = json_io::parse_text(r#"{"a": 3, "b": 5}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "number/add", "path": "/a", "value-path": "/b"},
            {"op": "number/greater", "path": "/is-big", "left-value-path": "/a", "right-value": 7}
        ]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"b":5,"a":8,"is-big":true}"#);
}
