//! Error taxonomy for the patch virtual machine.
//!
//! Every fallible operation in this crate returns one of the enums below
//! rather than panicking; `RuntimeError` is the error type the VM's
//! execution surface (`Patch::apply`) actually returns, and absorbs the
//! narrower error kinds via `#[from]` so callers only need to match on
//! one top-level error type.

use thiserror::Error;

/// Failure while compiling a patch from its JSON-array / host-native form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The `op` field named an opcode that isn't in the dispatch table.
    #[error("unknown opcode `{op}`")]
    UnknownOp {
        /// The opcode string that failed to resolve.
        op: String,
    },

    /// The descriptor didn't have the shape every op requires.
    #[error("malformed operation descriptor: {reason}")]
    MalformedDescriptor {
        /// Human-readable description of what was wrong.
        reason: String,
    },
}

/// Failure resolving or navigating a JSON Pointer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// An object along the path is missing the requested key.
    #[error("no such key `{key}` in object at `{pointer}`")]
    KeyError {
        /// Pointer to the object that was missing the key.
        pointer: String,
        /// The key that was looked up.
        key: String,
    },

    /// An array along the path doesn't have the requested index.
    #[error("index `{index}` out of range for array at `{pointer}`")]
    IndexError {
        /// Pointer to the array that was indexed.
        pointer: String,
        /// The index (or `-`) that was requested.
        index: String,
    },

    /// The pointer text itself didn't parse as RFC 6901.
    #[error("malformed JSON pointer `{text}`: {reason}")]
    MalformedPointer {
        /// The offending pointer text.
        text: String,
        /// Human-readable description of why it's malformed.
        reason: String,
    },
}

/// Error produced while executing a compiled patch against a document.
/// Wraps the narrower kinds that can surface mid-execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Navigating a pointer failed.
    #[error(transparent)]
    Pointer(#[from] PointerError),

    /// A resolved operand, or the current value at a path, had the wrong
    /// kind for the operation being applied.
    #[error("op `{op}`: operand `{field}` has the wrong kind (expected {expected}, found {found})")]
    TypeError {
        /// The opcode that raised the error.
        op: String,
        /// The field name of the offending operand.
        field: String,
        /// The kind the operator required.
        expected: &'static str,
        /// The kind that was actually found.
        found: &'static str,
    },

    /// `require_decimal` was violated, or a Number would have been
    /// non-finite.
    #[error("{reason}")]
    ValueError {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// Decimal arithmetic overflowed or would have produced a non-finite
    /// result.
    #[error("op `{op}`: arithmetic error: {reason}")]
    NumericError {
        /// The opcode that raised the error.
        op: String,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// A `test` operation's value didn't match the document.
    #[error("`test` failed at `{pointer}`: expected {expected}, found {found}")]
    TestFailed {
        /// Pointer that was tested.
        pointer: String,
        /// The expected value, rendered for display.
        expected: String,
        /// The actual value found, rendered for display.
        found: String,
    },

    /// `check-path`/`counter-path` escaped the control op's own scope.
    #[error("op `{op}`: `{field}` (`{pointer}`) is not a descendant of scope `{scope}`")]
    ScopeError {
        /// The opcode that raised the error.
        op: String,
        /// The field name carrying the offending pointer.
        field: String,
        /// The offending pointer text.
        pointer: String,
        /// The scope's own path text.
        scope: String,
    },

    /// A mandatory field (and its `-path` sibling) were both absent.
    #[error("op `{op}`: missing required field `{field}`")]
    MissingField {
        /// The opcode that raised the error.
        op: String,
        /// The field name that was required.
        field: String,
    },
}
