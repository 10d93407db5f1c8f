//! Control-flow operators (spec §4.E), grounded on `jotvm/controls.py`.
//!
//! Every control op's own `path` names a *scope*: a sub-value of the
//! outer document. `cond-apply-patch`, `while-loop`, `for-loop`, and
//! `apply-patch` resolve their own operands (`check`, `patch`, loop
//! bounds, ...) against the *outer* document, then mutably borrow the
//! sub-value at `path` and run their nested body against *that* as its
//! own root — so a nested op's `path` field is relative to the scope,
//! not the outer document (`jotvm/controls.py`'s repeated
//! `work_dict = path.get(json_doc); patch.apply(work_dict)`). Borrowing
//! the scope mutably means every outer-document operand must be
//! resolved to an owned value before the sub-borrow starts (spec §9's
//! re-architecture hint).
//!
//! `call-patch` and `call-func` are different: their `path` field is
//! carried (every descriptor needs one) but unused — each builds a
//! brand-new, empty call frame instead of borrowing into the document,
//! runs its body against that frame, and copies results back out by
//! pointer (`result-paths` / `out-path`).

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::RuntimeError;
use crate::pointer::Pointer;
use crate::resolver::{resolve_field, resolve_field_optional};
use crate::trace::Tracer;
use crate::value::Value;

use super::{CompiledOp, Opcode};

/// The `-op` opcode variants carry a single op descriptor instead of an
/// array; normalize to a one-element array so the rest of the pipeline
/// only ever deals with patch bodies (spec §4.D.4/§4.E, matching
/// `ExtJsonPatch.from_json_array(JsonArray([patch_op]))` in
/// `jotvm/controls.py`).
fn normalize_patch_body(opcode: Opcode, body: Value) -> Value {
    match opcode {
        Opcode::CtrlCondApplyPatchOp | Opcode::CtrlApplyPatchOp => Value::Array(vec![body]),
        _ => body,
    }
}

/// `ctrl/cond-apply-patch`: `check`/`check-path` selects `true-patch` or
/// `false-patch` (either may be absent, meaning no-op for that branch).
/// `ctrl/cond-apply-patch-op` is the same with `{true,false}-patch-op`
/// carrying a single op instead of an array. Unlike `while-loop`/
/// `for-loop`, `check` here is **not** scope-restricted (`jotvm`'s
/// `cond_apply_patch_op_apply` resolves it against the full document).
pub(super) fn cond_apply_patch(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let check = resolve_field(name, "check", &op.fields, document)?.ensure_bool(name, "check")?;
    let field = match (op.opcode, check) {
        (Opcode::CtrlCondApplyPatch, true) => "true-patch",
        (Opcode::CtrlCondApplyPatch, false) => "false-patch",
        (Opcode::CtrlCondApplyPatchOp, true) => "true-patch-op",
        (Opcode::CtrlCondApplyPatchOp, false) => "false-patch-op",
        _ => unreachable!("cond_apply_patch only dispatched for the conditional opcodes"),
    };
    let Some(body) = resolve_field_optional(name, field, &op.fields, document)? else {
        return Ok(());
    };
    let body = normalize_patch_body(op.opcode, body);
    let sub = op.path.get_mut(document).map_err(RuntimeError::Pointer)?;
    super::run_sub_patch(&body, sub, tracer)
}

/// `ctrl/while-loop`: a do-while loop. The body runs once unconditionally,
/// then keeps re-running while the `Bool` at `check-path` (a pointer
/// that must stay within `path`, spec §4.E.2) reads truthy *after* each
/// run (spec §9's open question: mirror the "always once" shape
/// exactly; see `DESIGN.md` for why the freshly-read check, not a
/// stale pre-loop snapshot, is what this crate reproduces).
pub(super) fn while_loop(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let check_field = op.fields.get("check-path").ok_or_else(|| RuntimeError::MissingField {
        op: name.to_string(),
        field: "check-path".to_string(),
    })?;
    let check_path = Pointer::parse(check_field.ensure_string(name, "check-path")?).map_err(RuntimeError::Pointer)?;
    if !check_path.is_within(&op.path) {
        return Err(RuntimeError::ScopeError {
            op: name.to_string(),
            field: "check-path".to_string(),
            pointer: check_path.to_text(),
            scope: op.path.to_text(),
        });
    }
    let local_check = check_path.strip_prefix(&op.path);

    let body = resolve_field(name, "patch", &op.fields, document)?;
    let ops = super::compile_ops(&body).map_err(|e| RuntimeError::ValueError { reason: e.to_string() })?;

    let sub = op.path.get_mut(document).map_err(RuntimeError::Pointer)?;

    super::run_compiled(&ops, sub, tracer)?;
    loop {
        let check = local_check.get(sub).map_err(RuntimeError::Pointer)?.ensure_bool(name, "check")?;
        if !check {
            return Ok(());
        }
        super::run_compiled(&ops, sub, tracer)?;
    }
}

/// `ctrl/for-loop`: an inclusive-bounds counting loop over
/// `start-value..=stop-value` stepping by `increment` (default `1`).
/// Loop bounds are normalized to native integers before iterating
/// (spec §9) since the counter itself is just a loop index, not an
/// exact-decimal quantity under arithmetic. `counter-path`, if present,
/// must be a descendant of `path`; the slot it names is saved before
/// the loop and restored after — created fresh if it didn't already
/// exist, removed again at exit either way — using remove-then-add so
/// an array-position counter is always replaced, never inserted twice.
pub(super) fn for_loop(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let start = ensure_integer(name, "start-value", resolve_field(name, "start-value", &op.fields, document)?.ensure_number(name, "start-value")?)?;
    let stop = ensure_integer(name, "stop-value", resolve_field(name, "stop-value", &op.fields, document)?.ensure_number(name, "stop-value")?)?;
    let increment = match resolve_field_optional(name, "increment", &op.fields, document)? {
        Some(v) => ensure_integer(name, "increment", v.ensure_number(name, "increment")?)?,
        None => 1,
    };
    if increment == 0 {
        return Err(RuntimeError::ValueError {
            reason: format!("op `{name}`: `increment` must not be zero"),
        });
    }

    let local_counter = match op.fields.get("counter-path") {
        Some(field) => {
            let counter_path = Pointer::parse(field.ensure_string(name, "counter-path")?).map_err(RuntimeError::Pointer)?;
            if !counter_path.is_within(&op.path) {
                return Err(RuntimeError::ScopeError {
                    op: name.to_string(),
                    field: "counter-path".to_string(),
                    pointer: counter_path.to_text(),
                    scope: op.path.to_text(),
                });
            }
            Some(counter_path.strip_prefix(&op.path))
        }
        None => None,
    };

    let body = resolve_field(name, "patch", &op.fields, document)?;
    let ops = super::compile_ops(&body).map_err(|e| RuntimeError::ValueError { reason: e.to_string() })?;

    let sub = op.path.get_mut(document).map_err(RuntimeError::Pointer)?;

    let backup = match &local_counter {
        Some(counter) if counter.exists(sub) => Some(counter.get(sub).map_err(RuntimeError::Pointer)?.clone()),
        _ => None,
    };

    let mut i = start;
    loop {
        if increment > 0 {
            if i > stop {
                break;
            }
        } else if i < stop {
            break;
        }

        if let Some(counter) = &local_counter {
            if counter.exists(sub) {
                counter.remove(sub).map_err(RuntimeError::Pointer)?;
            }
            counter.add(sub, Value::Number(Decimal::from(i))).map_err(RuntimeError::Pointer)?;
        }
        super::run_compiled(&ops, sub, tracer)?;

        i = i.checked_add(increment).ok_or_else(|| RuntimeError::NumericError {
            op: name.to_string(),
            reason: "loop counter overflowed while stepping".to_string(),
        })?;
    }

    if let Some(counter) = &local_counter {
        if counter.exists(sub) {
            counter.remove(sub).map_err(RuntimeError::Pointer)?;
        }
        if let Some(value) = backup {
            counter.add(sub, value).map_err(RuntimeError::Pointer)?;
        }
    }
    Ok(())
}

/// Normalize a resolved loop bound to a native integer (spec §9:
/// "resolver-returned numbers ... must be normalized to a native
/// integer range before iteration").
fn ensure_integer(op: &str, field: &str, value: Decimal) -> Result<i64, RuntimeError> {
    if !value.fract().is_zero() {
        return Err(RuntimeError::ValueError {
            reason: format!("op `{op}`: `{field}` ({value}) must be an integer-valued number"),
        });
    }
    value.to_i64().ok_or_else(|| RuntimeError::ValueError {
        reason: format!("op `{op}`: `{field}` ({value}) is out of native integer range"),
    })
}

/// `ctrl/apply-patch`: run `patch`/`patch-path` against the sub-view at
/// `path`. `ctrl/apply-patch-op` is the same, but the body is a single
/// op resolved from `patch-op`/`patch-op-path` (`jotvm/controls.py`'s
/// `apply_patch_op_op_apply`, which reads `patch-op`, not `patch`).
pub(super) fn apply_patch(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let field = match op.opcode {
        Opcode::CtrlApplyPatch => "patch",
        Opcode::CtrlApplyPatchOp => "patch-op",
        _ => unreachable!("apply_patch only dispatched for the apply-patch opcodes"),
    };
    let body = resolve_field(name, field, &op.fields, document)?;
    let body = normalize_patch_body(op.opcode, body);
    let sub = op.path.get_mut(document).map_err(RuntimeError::Pointer)?;
    super::run_sub_patch(&body, sub, tracer)
}

/// `ctrl/call-patch`: a named-arg call over a fresh, empty call frame
/// (`jotvm/controls.py`'s `call_patch_op_apply`) — `path` is not used as
/// a scope here, unlike the other control ops.
///
/// `args` maps local pointers to literal values, deep-copied into the
/// frame. `args-paths` maps local pointers to pointers in the *outer*
/// document, whose values are deep-copied in. The patch (`patch`/
/// `patch-path`) then runs against the frame alone — it cannot see the
/// outer document at all. Finally `result-paths` maps local pointers
/// (read from the now-finished frame) to destination pointers written
/// back on the outer document.
pub(super) fn call_patch(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let mut frame = Value::empty_object();

    if let Some(args) = op.fields.get("args") {
        for (local, value) in args.ensure_object(name, "args")? {
            let pointer = Pointer::parse(local).map_err(RuntimeError::Pointer)?;
            pointer.add(&mut frame, value.clone()).map_err(RuntimeError::Pointer)?;
        }
    }
    if let Some(args_paths) = op.fields.get("args-paths") {
        for (local, source) in args_paths.ensure_object(name, "args-paths")? {
            let local_pointer = Pointer::parse(local).map_err(RuntimeError::Pointer)?;
            let source_pointer = Pointer::parse(source.ensure_string(name, "args-paths")?).map_err(RuntimeError::Pointer)?;
            let value = source_pointer.get(document).map_err(RuntimeError::Pointer)?.clone();
            local_pointer.add(&mut frame, value).map_err(RuntimeError::Pointer)?;
        }
    }

    let body = resolve_field(name, "patch", &op.fields, document)?;
    super::run_sub_patch(&body, &mut frame, tracer)?;

    if let Some(result_paths) = op.fields.get("result-paths") {
        for (local, dest) in result_paths.ensure_object(name, "result-paths")? {
            let local_pointer = Pointer::parse(local).map_err(RuntimeError::Pointer)?;
            let value = local_pointer.get(&frame).map_err(RuntimeError::Pointer)?.clone();
            let dest_pointer = Pointer::parse(dest.ensure_string(name, "result-paths")?).map_err(RuntimeError::Pointer)?;
            dest_pointer.add(document, value).map_err(RuntimeError::Pointer)?;
        }
    }
    Ok(())
}

/// Applies `call-func`'s field-name convention (spec §4.E.6) to one
/// level of input arguments: a field `foo` binds its literal value
/// under `foo`; `foo-path` dereferences a pointer into `document` and
/// binds the result under `foo`. Any resulting Object value recurses,
/// applying the same convention to its own fields (`jotvm/controls.py`'s
/// `_prepare_func_input`).
fn prepare_func_input(fields: &IndexMap<String, Value>, document: &Value) -> Result<IndexMap<String, Value>, RuntimeError> {
    let mut inp = IndexMap::new();
    for (key, value) in fields {
        let (name, resolved) = match key.strip_suffix("-path") {
            Some(base) => {
                let pointer = Pointer::parse(value.ensure_string("ctrl/call-func", key)?).map_err(RuntimeError::Pointer)?;
                let resolved = pointer.get(document).map_err(RuntimeError::Pointer)?.clone();
                (base.to_string(), resolved)
            }
            None => (key.clone(), value.clone()),
        };
        let resolved = match resolved {
            Value::Object(nested) => Value::Object(prepare_func_input(&nested, document)?),
            other => other,
        };
        inp.insert(name, resolved);
    }
    Ok(inp)
}

/// `ctrl/call-func`: convention-based function call
/// (`jotvm/controls.py`'s `call_func_op_apply`). Every field other than
/// `op`, `patch`, `patch-path`, and `out-path` is an input argument,
/// marshaled via [`prepare_func_input`] into `/inp` of a fresh frame
/// (no connection to `path`, same as `ctrl/call-patch`). The `req`
/// sub-mapping of `/inp`, if any, is moved out to the frame's top-level
/// `/req` so a caller can inject callee dependencies (e.g. other
/// function bodies for mutual recursion) without them looking like
/// ordinary arguments. The body runs against the frame alone; `/out`
/// must exist when it returns and is copied to `out-path` on the outer
/// document.
pub(super) fn call_func(op: &CompiledOp, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();

    let mut arg_fields = op.fields.clone();
    arg_fields.shift_remove("patch");
    arg_fields.shift_remove("patch-path");
    arg_fields.shift_remove("out-path");

    let mut inp = prepare_func_input(&arg_fields, document)?;
    let req = match inp.shift_remove("req") {
        Some(value) => value,
        None => Value::empty_object(),
    };

    let mut frame_fields = IndexMap::new();
    frame_fields.insert("inp".to_string(), Value::Object(inp));
    frame_fields.insert("req".to_string(), req);
    let mut frame = Value::Object(frame_fields);

    let body = resolve_field(name, "patch", &op.fields, document)?;
    super::run_sub_patch(&body, &mut frame, tracer)?;

    let out = match frame.as_object_mut().and_then(|map| map.shift_remove("out")) {
        Some(value) => value,
        None => {
            return Err(RuntimeError::MissingField {
                op: name.to_string(),
                field: "out".to_string(),
            })
        }
    };

    let out_path_field = op.fields.get("out-path").ok_or_else(|| RuntimeError::MissingField {
        op: name.to_string(),
        field: "out-path".to_string(),
    })?;
    let out_path = Pointer::parse(out_path_field.ensure_string(name, "out-path")?).map_err(RuntimeError::Pointer)?;
    out_path.add(document, out).map_err(RuntimeError::Pointer)
}
