use json_patch_vm::{json_io, CollectingTracer, Patch, Pointer, TraceEvent, Tracer, Value};
use rstest::rstest;

#[test]
fn call_patch_builds_a_fresh_frame_and_writes_results_back_by_pointer() {
    // `path` is carried (every descriptor needs one) but unused by
    // `ctrl/call-patch` itself — the callee runs against a brand-new,
    // empty frame, never the outer document.
    let mut doc = json_io::parse_text(r#"{"number2": 6, "sum": null}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[{
            "op": "ctrl/call-patch",
            "path": "",
            "args": {"/x": 4},
            "args-paths": {"/y": "/number2"},
            "patch": [{"op": "number/add", "path": "/x", "value-path": "/y"}],
            "result-paths": {"/x": "/sum"}
        }]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"number2":6,"sum":10}"#);
}

#[test]
fn call_func_builds_the_inp_req_out_frame_and_reads_back_the_result() {
    // Mirrors spec §8 concrete scenario 6: literal `x`, indirect
    // `y-path`, result written to `out-path` on the outer document —
    // the callee never sees `/number2` directly, only `/inp/y`.
    let mut doc = json_io::parse_text(r#"{"number2": 41, "arith-result": null}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[{
            "op": "ctrl/call-func",
            "path": "",
            "out-path": "/arith-result",
            "x": 5,
            "y-path": "/number2",
            "patch": [
                {"op": "add", "path": "/out", "value-path": "/inp/x"},
                {"op": "number/add", "path": "/out", "value-path": "/inp/y"}
            ]
        }]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"number2":41,"arith-result":46}"#);
}

#[test]
fn call_func_out_path_inserts_into_an_array_rather_than_overwriting() {
    // `out-path` uses plain pointer `add`, so targeting an existing
    // array index shifts the tail right instead of dropping whatever
    // was already there.
    let mut doc = json_io::parse_text(r#"{"items": ["a", "b"]}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[{
            "op": "ctrl/call-func",
            "path": "",
            "out-path": "/items/0",
            "patch": [{"op": "add", "path": "/out", "value": "inserted"}]
        }]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"items":["inserted","a","b"]}"#);
}

#[test]
fn single_op_control_variants_normalize_to_one_element_patches() {
    let mut doc = json_io::parse_text(r#"{"flag": true, "value": 1}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[{
            "op": "ctrl/cond-apply-patch-op",
            "path": "",
            "check-path": "/flag",
            "true-patch-op": {"op": "replace", "path": "/value", "value": 42}
        }]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), r#"{"flag":true,"value":42}"#);
}

#[test]
fn self_modifying_patch_rewrites_its_own_body_before_running_it() {
    // The op sequence first overwrites the stored op, then applies it —
    // `ctrl/apply-patch-op` must resolve `patch-op-path` live, against
    // the just-mutated document, not a compile-time snapshot.
    let mut doc = json_io::parse_text(
        r#"{"body": {"op": "add", "path": "/out", "value": "first"}, "out": null}"#,
    )
    .unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "replace", "path": "/body/value", "value": "second"},
            {"op": "ctrl/apply-patch-op", "path": "", "patch-op-path": "/body"}
        ]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    let rendered = json_io::render_text(&doc);
    assert!(rendered.contains(r#""out":"second""#));
}

#[test]
fn for_loop_with_dynamic_path_multiplies_each_array_element() {
    // Spec §8 scenario 4: a loop body that builds its own next op's
    // `path` at runtime — `array/join-path` assembles `/arr/<i>` from
    // `["arr", i]`, then `ctrl/apply-patch-op` applies a freshly
    // rewritten op descriptor read back via `patch-op-path`, one index
    // at a time.
    let mut doc = json_io::parse_text(r#"{"arr": [1, 2, 3]}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "array/length", "path": "/len", "value-path": "/arr"},
            {"op": "number/sub", "path": "/len", "value": 1},
            {
                "op": "ctrl/for-loop",
                "path": "",
                "start-value": 0,
                "stop-value-path": "/len",
                "counter-path": "/i",
                "patch": [
                    {"op": "add", "path": "/tmp", "value": ["arr"]},
                    {"op": "add", "path": "/tmp/-", "value-path": "/i"},
                    {"op": "array/join-path", "path": "/seg", "value-path": "/tmp"},
                    {"op": "add", "path": "/dynop", "value": {"op": "number/mul", "path": "", "value": 3}},
                    {"op": "replace", "path": "/dynop/path", "value-path": "/seg"},
                    {"op": "ctrl/apply-patch-op", "path": "", "patch-op-path": "/dynop"}
                ]
            }
        ]"#,
    )
    .unwrap();
    patch.apply(&mut doc).unwrap();
    let arr = Pointer::parse("/arr").unwrap().get(&doc).unwrap();
    assert_eq!(
        arr,
        &Value::Array(vec![Value::Number(3.into()), Value::Number(6.into()), Value::Number(9.into())])
    );
}

#[test]
fn collecting_tracer_records_initial_state_and_a_before_after_pair_per_op() {
    let mut doc = json_io::parse_text(r#"{"n": 0}"#).unwrap();
    let patch = Patch::from_json_text(
        r#"[
            {"op": "number/add", "path": "/n", "value": 1},
            {"op": "number/add", "path": "/n", "value": 1}
        ]"#,
    )
    .unwrap();
    let mut tracer = CollectingTracer::new();
    tracer.enable();
    patch.apply_traced(&mut doc, &mut tracer).unwrap();
    // one initial-state event, then a before/after pair per op.
    assert_eq!(tracer.entries().len(), 1 + 2 * 2);
    assert!(matches!(tracer.entries()[0], TraceEvent::InitialState(_)));
    assert!(matches!(tracer.entries()[1], TraceEvent::BeforeOp(_)));
    assert!(matches!(tracer.entries()[2], TraceEvent::AfterOp(_)));
    assert!(tracer.is_active());
}

#[rstest]
#[case("number/add", 2, 3, 5)]
#[case("number/sub", 5, 3, 2)]
#[case("number/mul", 4, 3, 12)]
fn binary_arithmetic_opcodes(#[case] op: &str, #[case] lhs: i64, #[case] rhs: i64, #[case] expected: i64) {
    let mut doc = json_io::parse_text(&format!(r#"{{"v": {lhs}}}"#)).unwrap();
    let patch = Patch::from_json_text(&format!(r#"[{{"op": "{op}", "path": "/v", "value": {rhs}}}]"#)).unwrap();
    patch.apply(&mut doc).unwrap();
    assert_eq!(json_io::render_text(&doc), format!(r#"{{"v":{expected}}}"#));
}
