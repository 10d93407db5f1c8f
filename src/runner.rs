//! The patch runner: a compiled, immutable sequence of operations that
//! can be applied to any document of the right shape.

use crate::error::{CompileError, RuntimeError};
use crate::ops::CompiledOp;
use crate::trace::{NullTracer, Tracer};
use crate::value::Value;

/// A compiled patch: an ordered list of operations. Compilation parses
/// every op's `path` and separates its operand fields once, up front, so
/// applying the same patch to many documents doesn't re-parse anything
/// (spec §5: compiled patches are immutable and safely shareable, `Send
/// + Sync`, across threads so long as each `apply` call gets its own
/// document).
#[derive(Debug, Clone)]
pub struct Patch {
    ops: Vec<CompiledOp>,
}

impl Patch {
    /// Compile a patch from its JSON-array form (`[{"op": ..., "path": ...}, ...]`).
    pub fn from_json_array(array: &Value) -> Result<Patch, CompileError> {
        Ok(Patch {
            ops: crate::ops::compile_ops(array)?,
        })
    }

    /// Compile a patch from JSON text.
    pub fn from_json_text(text: &str) -> Result<Patch, RuntimeError> {
        let value = crate::json_io::parse_text(text)?;
        Patch::from_json_array(&value).map_err(|e| RuntimeError::ValueError { reason: e.to_string() })
    }

    /// Alias for [`Patch::from_json_array`] — the host-native form and
    /// the JSON-array form are the same [`Value`] shape in this crate,
    /// since [`Value`] already *is* the host-native representation.
    pub fn from_native(array: &Value) -> Result<Patch, CompileError> {
        Patch::from_json_array(array)
    }

    /// Reconstruct the original JSON array of op descriptors, verbatim
    /// (spec §8.1's round-trip property, matching
    /// `JsonPatchOpBase.to_json_object`).
    pub fn to_json_array(&self) -> Value {
        Value::Array(self.ops.iter().map(CompiledOp::to_value).collect())
    }

    /// Alias for [`Patch::to_json_array`].
    pub fn to_native(&self) -> Value {
        self.to_json_array()
    }

    /// The compiled operations, in order.
    pub(crate) fn ops(&self) -> &[CompiledOp] {
        &self.ops
    }

    /// Apply this patch to `document` in place, discarding any trace.
    pub fn apply(&self, document: &mut Value) -> Result<(), RuntimeError> {
        self.apply_traced(document, &mut NullTracer)
    }

    /// Apply this patch to `document` in place, recording each step to
    /// `tracer` (spec §6's trace sink; spec §4.F: "the runner emits:
    /// initial state, the descriptor of each op before execution, and
    /// the post-op state").
    ///
    /// There is no rollback: if an op partway through fails, the
    /// document is left exactly as the ops before it left it (spec §5 —
    /// the VM does not offer transactional application the way the
    /// teacher's `apply_patches` rollback-on-failure closures do).
    pub fn apply_traced(&self, document: &mut Value, tracer: &mut dyn Tracer) -> Result<(), RuntimeError> {
        tracing::debug!(op_count = self.ops.len(), "applying patch");
        tracer.record_initial(document);
        for op in &self.ops {
            tracing::trace!(op = op.opcode.as_str(), path = %op.path.to_text(), "executing op");
            tracer.record_before(&op.to_value());
            op.execute(document, tracer)?;
            tracer.record_after(document);
        }
        Ok(())
    }
}
