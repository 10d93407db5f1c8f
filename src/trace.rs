//! The programmatic trace sink (spec §6, §9), re-architected from
//! `jotvm/debug.py`'s `SimpleDebugPrinter` process singleton into an
//! injected interface: callers hand `Patch::apply_traced` a `&mut dyn
//! Tracer` instead of reaching for ambient global state, so two patches
//! can run concurrently on different documents (in different threads)
//! without fighting over one printer.
//!
//! This is distinct from the crate's ambient `tracing` spans (emitted
//! unconditionally via `tracing::debug!`/`trace!`): a `Tracer` records
//! the VM's own notion of program trace — initial document, op
//! descriptor, post-op document — the same three things
//! `jotvm/json_patch.py`'s `JsonPatchBase.__call__` fed to its debug
//! printer (`'=== Initial State ==='`, `repr(op)` before each op, the
//! new document state after).

use crate::value::Value;

/// One trace event emitted during a patch application, in the order
/// `jotvm/json_patch.py`'s `JsonPatchBase.__call__` prints them: the
/// document once at the start, then a descriptor/state pair around
/// every op.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// The document as it stood before any op in this run applied.
    InitialState(Value),
    /// The full descriptor of the op about to execute, emitted before
    /// it runs.
    BeforeOp(Value),
    /// The document as it stood immediately after an op applied.
    AfterOp(Value),
}

/// Receives a trace event per patch application.
///
/// `enable`/`disable`/`is_active` mirror `SimpleDebugPrinter`'s surface
/// so a `Tracer` can be wired up once and toggled cheaply without
/// un-registering it.
pub trait Tracer {
    /// Turn tracing on.
    fn enable(&mut self);

    /// Turn tracing off; `record_*` calls become no-ops.
    fn disable(&mut self);

    /// Whether this tracer is currently active.
    fn is_active(&self) -> bool;

    /// Record the document's state before any op in this run has
    /// executed. No-ops when [`Tracer::is_active`] is `false`.
    fn record_initial(&mut self, document: &Value);

    /// Record one op's full descriptor, immediately before it executes.
    /// No-ops when [`Tracer::is_active`] is `false`.
    fn record_before(&mut self, descriptor: &Value);

    /// Record the document's state immediately after an op applied.
    /// No-ops when [`Tracer::is_active`] is `false`.
    fn record_after(&mut self, document: &Value);
}

/// A `Tracer` that discards everything — the default when a caller
/// doesn't care about the VM's step-by-step trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn enable(&mut self) {}
    fn disable(&mut self) {}
    fn is_active(&self) -> bool {
        false
    }
    fn record_initial(&mut self, _document: &Value) {}
    fn record_before(&mut self, _descriptor: &Value) {}
    fn record_after(&mut self, _document: &Value) {}
}

/// A `Tracer` that appends each event to an in-memory log, for tests and
/// interactive debugging — the direct analog of
/// `SimpleDebugPrinter.debug` printing to stdout, except callers decide
/// what to do with the entries instead of it going straight to a
/// terminal.
#[derive(Debug, Default)]
pub struct CollectingTracer {
    active: bool,
    entries: Vec<TraceEvent>,
}

impl CollectingTracer {
    /// A new, inactive tracer with an empty log.
    pub fn new() -> CollectingTracer {
        CollectingTracer::default()
    }

    /// The recorded events, in emission order.
    pub fn entries(&self) -> &[TraceEvent] {
        &self.entries
    }
}

impl Tracer for CollectingTracer {
    fn enable(&mut self) {
        self.active = true;
    }

    fn disable(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn record_initial(&mut self, document: &Value) {
        if self.active {
            self.entries.push(TraceEvent::InitialState(document.clone()));
        }
    }

    fn record_before(&mut self, descriptor: &Value) {
        if self.active {
            self.entries.push(TraceEvent::BeforeOp(descriptor.clone()));
        }
    }

    fn record_after(&mut self, document: &Value) {
        if self.active {
            self.entries.push(TraceEvent::AfterOp(document.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut t = CollectingTracer::new();
        t.record_initial(&Value::Null);
        t.record_before(&Value::Null);
        t.record_after(&Value::Null);
        assert!(t.entries().is_empty());
    }

    #[test]
    fn enabled_tracer_accumulates_in_order() {
        let mut t = CollectingTracer::new();
        t.enable();
        t.record_initial(&Value::Null);
        t.record_before(&Value::Bool(true));
        t.record_after(&Value::Bool(true));
        assert_eq!(t.entries().len(), 3);
        assert!(matches!(t.entries()[0], TraceEvent::InitialState(Value::Null)));
        assert!(matches!(t.entries()[1], TraceEvent::BeforeOp(Value::Bool(true))));
        assert!(matches!(t.entries()[2], TraceEvent::AfterOp(Value::Bool(true))));
        t.disable();
        t.record_after(&Value::Null);
        assert_eq!(t.entries().len(), 3);
    }
}
