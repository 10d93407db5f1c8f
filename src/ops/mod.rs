//! Operation dispatch (spec §4.D): a closed, exhaustively-matched
//! [`Opcode`] enum replaces the runtime string→function lookup table
//! the spec's own design notes (§9) flag for replacement, while each
//! op's actual behavior stays grounded on the corresponding `jotvm`
//! module (`json_patch_ops.py`, `binary_ops.py`, `relation_ops.py`,
//! `endo_unary_ops.py`, `trafo_unary_ops.py`, `controls.py`).

mod arithmetic;
mod control;
mod patch_ops;
mod relations;
mod unary;

use std::fmt;

use indexmap::IndexMap;

use crate::error::{CompileError, RuntimeError};
use crate::pointer::Pointer;
use crate::trace::Tracer;
use crate::value::Value;

/// Every opcode this VM understands, grouped the way `jotvm`'s op-type
/// registries (`JsonPatch._get_op_types` vs `ExtJsonPatch._get_op_types`)
/// group them, collapsed into one flat enum since this crate has no
/// "core-only" vs "extended" patch distinction (spec §4.D treats them
/// uniformly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `add`.
    Add,
    /// `remove`.
    Remove,
    /// `replace`.
    Replace,
    /// `move`.
    Move,
    /// `copy`.
    Copy,
    /// `test`.
    Test,
    /// `number/add`.
    NumberAdd,
    /// `number/sub`.
    NumberSub,
    /// `number/mul`.
    NumberMul,
    /// `number/div`.
    NumberDiv,
    /// `bool/or`.
    BoolOr,
    /// `bool/and`.
    BoolAnd,
    /// `number/equal`.
    NumberEqual,
    /// `number/not-equal`.
    NumberNotEqual,
    /// `number/greater`.
    NumberGreater,
    /// `number/greater-equal`.
    NumberGreaterEqual,
    /// `number/less-equal`.
    NumberLessEqual,
    /// `number/trunc`.
    NumberTrunc,
    /// `number/sqrt`.
    NumberSqrt,
    /// `number/cos`.
    NumberCos,
    /// `number/sin`.
    NumberSin,
    /// `bool/not`.
    BoolNot,
    /// `string/split-path`.
    StringSplitPath,
    /// `array/join-path`.
    ArrayJoinPath,
    /// `array/length`.
    ArrayLength,
    /// `ctrl/cond-apply-patch`.
    CtrlCondApplyPatch,
    /// `ctrl/cond-apply-patch-op`.
    CtrlCondApplyPatchOp,
    /// `ctrl/while-loop`.
    CtrlWhileLoop,
    /// `ctrl/for-loop`.
    CtrlForLoop,
    /// `ctrl/apply-patch`.
    CtrlApplyPatch,
    /// `ctrl/apply-patch-op`.
    CtrlApplyPatchOp,
    /// `ctrl/call-patch`.
    CtrlCallPatch,
    /// `ctrl/call-func`.
    CtrlCallFunc,
}

impl Opcode {
    /// The wire string this opcode's `op` field carries.
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Remove => "remove",
            Opcode::Replace => "replace",
            Opcode::Move => "move",
            Opcode::Copy => "copy",
            Opcode::Test => "test",
            Opcode::NumberAdd => "number/add",
            Opcode::NumberSub => "number/sub",
            Opcode::NumberMul => "number/mul",
            Opcode::NumberDiv => "number/div",
            Opcode::BoolOr => "bool/or",
            Opcode::BoolAnd => "bool/and",
            Opcode::NumberEqual => "number/equal",
            Opcode::NumberNotEqual => "number/not-equal",
            Opcode::NumberGreater => "number/greater",
            Opcode::NumberGreaterEqual => "number/greater-equal",
            Opcode::NumberLessEqual => "number/less-equal",
            Opcode::NumberTrunc => "number/trunc",
            Opcode::NumberSqrt => "number/sqrt",
            Opcode::NumberCos => "number/cos",
            Opcode::NumberSin => "number/sin",
            Opcode::BoolNot => "bool/not",
            Opcode::StringSplitPath => "string/split-path",
            Opcode::ArrayJoinPath => "array/join-path",
            Opcode::ArrayLength => "array/length",
            Opcode::CtrlCondApplyPatch => "ctrl/cond-apply-patch",
            Opcode::CtrlCondApplyPatchOp => "ctrl/cond-apply-patch-op",
            Opcode::CtrlWhileLoop => "ctrl/while-loop",
            Opcode::CtrlForLoop => "ctrl/for-loop",
            Opcode::CtrlApplyPatch => "ctrl/apply-patch",
            Opcode::CtrlApplyPatchOp => "ctrl/apply-patch-op",
            Opcode::CtrlCallPatch => "ctrl/call-patch",
            Opcode::CtrlCallFunc => "ctrl/call-func",
        }
    }
}

impl TryFrom<&str> for Opcode {
    type Error = CompileError;

    fn try_from(op: &str) -> Result<Self, Self::Error> {
        Ok(match op {
            "add" => Opcode::Add,
            "remove" => Opcode::Remove,
            "replace" => Opcode::Replace,
            "move" => Opcode::Move,
            "copy" => Opcode::Copy,
            "test" => Opcode::Test,
            "number/add" => Opcode::NumberAdd,
            "number/sub" => Opcode::NumberSub,
            "number/mul" => Opcode::NumberMul,
            "number/div" => Opcode::NumberDiv,
            "bool/or" => Opcode::BoolOr,
            "bool/and" => Opcode::BoolAnd,
            "number/equal" => Opcode::NumberEqual,
            "number/not-equal" => Opcode::NumberNotEqual,
            "number/greater" => Opcode::NumberGreater,
            "number/greater-equal" => Opcode::NumberGreaterEqual,
            "number/less-equal" => Opcode::NumberLessEqual,
            "number/trunc" => Opcode::NumberTrunc,
            "number/sqrt" => Opcode::NumberSqrt,
            "number/cos" => Opcode::NumberCos,
            "number/sin" => Opcode::NumberSin,
            "bool/not" => Opcode::BoolNot,
            "string/split-path" => Opcode::StringSplitPath,
            "array/join-path" => Opcode::ArrayJoinPath,
            "array/length" => Opcode::ArrayLength,
            "ctrl/cond-apply-patch" => Opcode::CtrlCondApplyPatch,
            "ctrl/cond-apply-patch-op" => Opcode::CtrlCondApplyPatchOp,
            "ctrl/while-loop" => Opcode::CtrlWhileLoop,
            "ctrl/for-loop" => Opcode::CtrlForLoop,
            "ctrl/apply-patch" => Opcode::CtrlApplyPatch,
            "ctrl/apply-patch-op" => Opcode::CtrlApplyPatchOp,
            "ctrl/call-patch" => Opcode::CtrlCallPatch,
            "ctrl/call-func" => Opcode::CtrlCallFunc,
            other => {
                return Err(CompileError::UnknownOp {
                    op: other.to_string(),
                })
            }
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One compiled operation: its opcode, target pointer (already parsed,
/// spec §9's "pointer parsing happens once, at compile time, since a
/// descriptor's own `path` string never changes between applications"),
/// and the operand fields the resolver reads `F`/`F-path` from. `raw`
/// keeps the original descriptor object for exact round-tripping via
/// [`CompiledOp::to_value`].
#[derive(Debug, Clone)]
pub struct CompiledOp {
    pub(crate) opcode: Opcode,
    pub(crate) path: Pointer,
    pub(crate) fields: IndexMap<String, Value>,
    raw: IndexMap<String, Value>,
}

impl CompiledOp {
    /// Compile one op descriptor object (spec §4.D: every op has `op`
    /// and `path`; remaining keys are operand fields).
    pub fn compile(descriptor: &Value) -> Result<CompiledOp, CompileError> {
        let raw = descriptor
            .ensure_object("compile", "descriptor")
            .map_err(|_| CompileError::MalformedDescriptor {
                reason: "an operation descriptor must be a JSON object".to_string(),
            })?
            .clone();

        let op_text = raw
            .get("op")
            .and_then(|v| if let Value::String(s) = v { Some(s.as_str()) } else { None })
            .ok_or_else(|| CompileError::MalformedDescriptor {
                reason: "missing or non-string `op` field".to_string(),
            })?;
        let opcode = Opcode::try_from(op_text)?;

        let path_text = raw
            .get("path")
            .and_then(|v| if let Value::String(s) = v { Some(s.as_str()) } else { None })
            .ok_or_else(|| CompileError::MalformedDescriptor {
                reason: "missing or non-string `path` field".to_string(),
            })?;
        let path = Pointer::parse(path_text).map_err(|e| CompileError::MalformedDescriptor {
            reason: e.to_string(),
        })?;

        let mut fields = raw.clone();
        fields.shift_remove("op");
        fields.shift_remove("path");

        Ok(CompiledOp {
            opcode,
            path,
            fields,
            raw,
        })
    }

    /// Reconstruct the original descriptor object, verbatim down to key
    /// order (spec §8.1's round-trip property).
    pub fn to_value(&self) -> Value {
        Value::Object(self.raw.clone())
    }

    /// Execute this op against `document`, recording a trace entry
    /// afterward. `call_func_depth` lets `ctrl/call-func` bound its own
    /// recursion (spec §4.E) without a separate threaded-through stack
    /// type.
    pub(crate) fn execute(&self, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
        match self.opcode {
            Opcode::Add => patch_ops::add(self, document),
            Opcode::Remove => patch_ops::remove(self, document),
            Opcode::Replace => patch_ops::replace(self, document),
            Opcode::Move => patch_ops::mov(self, document),
            Opcode::Copy => patch_ops::copy(self, document),
            Opcode::Test => patch_ops::test(self, document),
            Opcode::NumberAdd | Opcode::NumberSub | Opcode::NumberMul | Opcode::NumberDiv | Opcode::BoolOr | Opcode::BoolAnd => {
                arithmetic::apply(self, document)
            }
            Opcode::NumberEqual
            | Opcode::NumberNotEqual
            | Opcode::NumberGreater
            | Opcode::NumberGreaterEqual
            | Opcode::NumberLessEqual => relations::apply(self, document),
            Opcode::NumberTrunc | Opcode::NumberSqrt | Opcode::NumberCos | Opcode::NumberSin | Opcode::BoolNot => {
                unary::apply_endo(self, document)
            }
            Opcode::StringSplitPath | Opcode::ArrayJoinPath | Opcode::ArrayLength => unary::apply_trafo(self, document),
            Opcode::CtrlCondApplyPatch | Opcode::CtrlCondApplyPatchOp => control::cond_apply_patch(self, document, tracer),
            Opcode::CtrlWhileLoop => control::while_loop(self, document, tracer),
            Opcode::CtrlForLoop => control::for_loop(self, document, tracer),
            Opcode::CtrlApplyPatch | Opcode::CtrlApplyPatchOp => control::apply_patch(self, document, tracer),
            Opcode::CtrlCallPatch => control::call_patch(self, document, tracer),
            Opcode::CtrlCallFunc => control::call_func(self, document, tracer),
        }
    }
}

/// Compile a JSON array of op descriptors into [`CompiledOp`]s, used by
/// [`Patch::from_json_array`] and by control ops compiling an inline
/// sub-patch body at execution time.
pub(crate) fn compile_ops(body: &Value) -> Result<Vec<CompiledOp>, CompileError> {
    let items = body.ensure_array("compile", "patch").map_err(|_| CompileError::MalformedDescriptor {
        reason: "a patch body must be a JSON array of op descriptors".to_string(),
    })?;
    items.iter().map(CompiledOp::compile).collect()
}

/// Run an already-compiled op sequence against `document`, in place —
/// the shared core of every control operator, grounded on
/// `jotvm/controls.py`'s repeated `ExtJsonPatch(...).apply(work_dict)`
/// calls. Kept separate from [`run_sub_patch`] so loops compile their
/// body once up front instead of recompiling it every iteration.
///
/// Each call is its own trace scope, matching
/// `jotvm/json_patch.py`'s `JsonPatchBase.__call__`: the document's
/// state is recorded once before any op runs, then every op's full
/// descriptor is recorded immediately before it executes and the
/// document's state immediately after.
pub(crate) fn run_compiled(ops: &[CompiledOp], document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    tracer.record_initial(document);
    for op in ops {
        tracer.record_before(&op.to_value());
        op.execute(document, tracer)?;
        tracer.record_after(document);
    }
    Ok(())
}

/// Compile-and-run a sub-patch body (array of descriptors) against
/// `document`, in place.
pub(crate) fn run_sub_patch(body: &Value, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
    let ops = compile_ops(body).map_err(|e| RuntimeError::ValueError { reason: e.to_string() })?;
    run_compiled(&ops, document, tracer)
}
