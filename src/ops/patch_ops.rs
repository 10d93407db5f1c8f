//! Core RFC 6902 operators, grounded on `jotvm/json_patch_ops.py` (and,
//! for the Rust idiom of mutating through a pointer, the teacher's
//! `add`/`remove`/`replace`/`mov`/`copy`/`test` functions in
//! `idubrov-json-patch`'s `lib.rs`).

use crate::error::RuntimeError;
use crate::resolver::resolve_field;
use crate::value::Value;

use super::CompiledOp;

/// `add`: insert `value`/`value-path` at `path`.
pub(super) fn add(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let value = resolve_field(op.opcode.as_str(), "value", &op.fields, document)?;
    op.path.add(document, value).map_err(RuntimeError::Pointer)
}

/// `remove`: delete whatever is at `path`.
pub(super) fn remove(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    op.path.remove(document).map_err(RuntimeError::Pointer)?;
    Ok(())
}

/// `replace`: `remove` then `add`, so the call fails if `path` didn't
/// already exist (mirrors the teacher's `replace`, which checks
/// existence before overwriting).
pub(super) fn replace(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let value = resolve_field(op.opcode.as_str(), "value", &op.fields, document)?;
    op.path.remove(document).map_err(RuntimeError::Pointer)?;
    op.path.add(document, value).map_err(RuntimeError::Pointer)
}

/// `move`: take the value at `from`, remove it, and add it at `path`.
/// Unlike every other operand field, `from` has no `from-path` sibling
/// (spec §6 lists it bare; `jotvm/json_patch_ops.py`'s `move_op_apply`
/// reads `self._fields['from']` directly) — it goes through
/// `required_field`, not the `-path` resolver.
pub(super) fn mov(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let from_text = required_field(op.opcode.as_str(), "from", &op.fields)?;
    let from = crate::pointer::Pointer::parse(from_text).map_err(RuntimeError::Pointer)?;
    let value = from.remove(document).map_err(RuntimeError::Pointer)?;
    op.path.add(document, value).map_err(RuntimeError::Pointer)
}

/// `copy`: deep-clone the value at `from` and add it at `path`. See
/// [`mov`] — `from` is a plain literal field, not resolved via `-path`.
pub(super) fn copy(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let from_text = required_field(op.opcode.as_str(), "from", &op.fields)?;
    let from = crate::pointer::Pointer::parse(from_text).map_err(RuntimeError::Pointer)?;
    let value = from.get(document).map_err(RuntimeError::Pointer)?.clone();
    op.path.add(document, value).map_err(RuntimeError::Pointer)
}

/// Read a mandatory plain-string field (no `-path` indirection).
fn required_field<'a>(op: &str, field: &str, fields: &'a indexmap::IndexMap<String, Value>) -> Result<&'a str, RuntimeError> {
    let value = fields.get(field).ok_or_else(|| RuntimeError::MissingField {
        op: op.to_string(),
        field: field.to_string(),
    })?;
    value.ensure_string(op, field)
}

/// `test`: fail unless the value at `path` equals `value`/`value-path`.
pub(super) fn test(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let expected = resolve_field(op.opcode.as_str(), "value", &op.fields, document)?;
    let found = op.path.get(document).map_err(RuntimeError::Pointer)?;
    if *found != expected {
        return Err(RuntimeError::TestFailed {
            pointer: op.path.to_text(),
            expected: crate::json_io::render_text(&expected),
            found: crate::json_io::render_text(found),
        });
    }
    Ok(())
}
