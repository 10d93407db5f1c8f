//! Binary arithmetic and boolean operators, grounded on
//! `jotvm/binary_ops.py`'s `BinaryOpBase.apply`: read the current value
//! at `path`, combine it with the resolved `value`/`value-path`
//! operand, then write the result back at `path` via remove-then-add
//! (so the write always replaces, never duplicates).

use crate::error::RuntimeError;
use crate::resolver::resolve_field;
use crate::value::Value;

use super::{CompiledOp, Opcode};

pub(super) fn apply(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let operand = resolve_field(name, "value", &op.fields, document)?;
    let current = op.path.get(document).map_err(RuntimeError::Pointer)?.clone();

    let result = match op.opcode {
        Opcode::NumberAdd => {
            let a = current.ensure_number(name, "path-value")?;
            let b = operand.ensure_number(name, "value")?;
            Value::num_add(name, a, b)?
        }
        Opcode::NumberSub => {
            let a = current.ensure_number(name, "path-value")?;
            let b = operand.ensure_number(name, "value")?;
            Value::num_sub(name, a, b)?
        }
        Opcode::NumberMul => {
            let a = current.ensure_number(name, "path-value")?;
            let b = operand.ensure_number(name, "value")?;
            Value::num_mul(name, a, b)?
        }
        Opcode::NumberDiv => {
            let a = current.ensure_number(name, "path-value")?;
            let b = operand.ensure_number(name, "value")?;
            Value::num_div(name, a, b)?
        }
        Opcode::BoolOr => {
            let a = current.ensure_bool(name, "path-value")?;
            let b = operand.ensure_bool(name, "value")?;
            Value::bool_or(a, b)
        }
        Opcode::BoolAnd => {
            let a = current.ensure_bool(name, "path-value")?;
            let b = operand.ensure_bool(name, "value")?;
            Value::bool_and(a, b)
        }
        _ => unreachable!("arithmetic::apply only dispatched for arithmetic/boolean opcodes"),
    };

    op.path.remove(document).map_err(RuntimeError::Pointer)?;
    op.path.add(document, result).map_err(RuntimeError::Pointer)
}
