//! Relational operators, grounded on `jotvm/relation_ops.py`'s
//! `BinaryRelationOpBase.apply`: resolve `left-value`/`right-value`,
//! compare, and write a fresh `Bool` at `path`. Note there is
//! deliberately no `number/less` opcode — the original only ever
//! defines `equal`, `not-equal`, `greater`, `greater-equal`, and
//! `less-equal`.

use std::cmp::Ordering;

use crate::error::RuntimeError;
use crate::resolver::resolve_field;
use crate::value::Value;

use super::{CompiledOp, Opcode};

pub(super) fn apply(op: &CompiledOp, document: &mut Value) -> Result<(), RuntimeError> {
    let name = op.opcode.as_str();
    let left = resolve_field(name, "left-value", &op.fields, document)?;
    let right = resolve_field(name, "right-value", &op.fields, document)?;

    let result = if matches!(op.opcode, Opcode::NumberEqual | Opcode::NumberNotEqual) {
        // Equality is defined for any pair of same-shape values (spec
        // §4.A), not just numbers — matching jotvm's generic `==`.
        let equal = left == right;
        matches!(op.opcode, Opcode::NumberEqual) == equal
    } else {
        let ordering = Value::num_cmp(name, &left, &right)?;
        match op.opcode {
            Opcode::NumberGreater => ordering == Ordering::Greater,
            Opcode::NumberGreaterEqual => ordering != Ordering::Less,
            Opcode::NumberLessEqual => ordering != Ordering::Greater,
            _ => unreachable!("relations::apply only dispatched for relational opcodes"),
        }
    };

    op.path.add(document, Value::Bool(result)).map_err(RuntimeError::Pointer)
}
