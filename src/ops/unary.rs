//! Unary operators. Two flavors, matching the split in `jotvm` between
//! `endo_unary_ops.py` (operand and result share one type, write
//! replaces the existing value at `path`) and `trafo_unary_ops.py`
//! (operand and result may differ in type, operand is mandatory).

use crate::error::RuntimeError;
use crate::resolver::resolve_field;
use crate::resolver::resolve_field_optional;
use crate::value::Value;

use super::{CompiledOp, Opcode};

/// `number/trunc`, `number/sqrt`, `number/cos`, `number/sin`, `bool/not`:
/// operate on `value`/`value-path` if present, else the current value at
/// `path` (`jotvm/endo_unary_ops.py`'s `EndoUnaryOpBase.apply`). The
/// write replaces `path` if it already exists, otherwise adds.
pub(super) fn apply_endo(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let operand = match resolve_field_optional(name, "value", &op.fields, document)? {
        Some(v) => v,
        None => op.path.get(document).map_err(RuntimeError::Pointer)?.clone(),
    };

    let result = match op.opcode {
        Opcode::NumberTrunc => Value::num_trunc(name, operand.ensure_number(name, "value")?)?,
        Opcode::NumberSqrt => Value::num_sqrt(name, operand.ensure_number(name, "value")?)?,
        Opcode::NumberCos => Value::num_cos(name, operand.ensure_number(name, "value")?)?,
        Opcode::NumberSin => Value::num_sin(name, operand.ensure_number(name, "value")?)?,
        Opcode::BoolNot => Value::bool_not(operand.ensure_bool(name, "value")?),
        _ => unreachable!("apply_endo only dispatched for endomorphic unary opcodes"),
    };

    if op.path.exists(document) {
        op.path.remove(document).map_err(RuntimeError::Pointer)?;
    }
    op.path.add(document, result).map_err(RuntimeError::Pointer)
}

/// `string/split-path`, `array/join-path`, `array/length`: operand is
/// mandatory (`jotvm/trafo_unary_ops.py`'s `TrafoUnaryOpBase.apply`),
/// result type may differ from the operand's, write replaces `path` if
/// it already exists.
pub(super) fn apply_trafo(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let operand = resolve_field(name, "value", &op.fields, document)?;

    let result = match op.opcode {
        Opcode::StringSplitPath => {
            let text = operand.ensure_string(name, "value")?;
            let pointer = crate::pointer::Pointer::parse(text).map_err(RuntimeError::Pointer)?;
            Value::Array(pointer.segments().iter().map(|s| Value::String(s.clone())).collect())
        }
        Opcode::ArrayJoinPath => {
            // `jotvm/json_pointer.py`'s `JsonPointer(list)` constructor
            // accepts integer-valued numbers alongside strings as path
            // elements, converting them with `int_to_str`; array/length
            // and for-loop counters being Numbers, this is what lets a
            // patch assemble `/arr/<i>` from `["arr", i]` dynamically.
            let items = operand.ensure_array(name, "value")?;
            let mut segments = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let field = format!("value[{i}]");
                let segment = match item {
                    Value::String(s) => s.clone(),
                    Value::Number(d) => {
                        if !d.fract().is_zero() {
                            return Err(RuntimeError::ValueError {
                                reason: format!("op `{name}`: `{field}` ({d}) must be an integer-valued number"),
                            });
                        }
                        d.trunc().to_string()
                    }
                    other => {
                        return Err(RuntimeError::TypeError {
                            op: name.to_string(),
                            field,
                            expected: "string or integer-valued number",
                            found: other.kind(),
                        })
                    }
                };
                segments.push(segment);
            }
            Value::String(crate::pointer::Pointer::from_segments(segments).to_text())
        }
        Opcode::ArrayLength => {
            let items = operand.ensure_array(name, "value")?;
            Value::Number(rust_decimal::Decimal::from(items.len()))
        }
        _ => unreachable!("apply_trafo only dispatched for transforming unary opcodes"),
    };

    if op.path.exists(document) {
        op.path.remove(document).map_err(RuntimeError::Pointer)?;
    }
    op.path.add(document, result).map_err(RuntimeError::Pointer)
}
