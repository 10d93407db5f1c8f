//! A small virtual machine over [JSON Patch (RFC 6902)](https://tools.ietf.org/html/rfc6902),
//! extended with arithmetic, relational, boolean, string/array
//! transform, and control-flow operators.
//!
//! Programs and data share one JSON value model ([`Value`]) and are
//! addressed with [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! ([`Pointer`]). A program — a [`Patch`] — is itself an ordinary JSON
//! array of operation descriptors, so a patch can read and rewrite
//! another patch body stored elsewhere in the same document before
//! applying it.
//!
//! # Usage
//!
//! Add this to your *Cargo.toml*:
//! ```toml
//! [dependencies]
//! json-patch-vm = "0.1"
//! ```
//!
//! # Examples
//!
//! ```rust
//! use json_patch_vm::{Patch, json_io};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut doc = json_io::parse_text(r#"{"counter": 0}"#)?;
//! let patch = Patch::from_json_text(r#"[
//!     { "op": "test", "path": "/counter", "value": 0 },
//!     { "op": "number/add", "path": "/counter", "value": 5 }
//! ]"#)?;
//! patch.apply(&mut doc)?;
//! assert_eq!(json_io::render_text(&doc), r#"{"counter":5}"#);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod json_io;
mod ops;
mod pointer;
mod resolver;
mod runner;
pub mod trace;
mod value;

pub use error::{CompileError, PointerError, RuntimeError};
pub use json_io::{from_native, parse_text, render_text, render_text_pretty, to_native};
pub use ops::Opcode;
pub use pointer::Pointer;
pub use runner::Patch;
pub use trace::{CollectingTracer, NullTracer, TraceEvent, Tracer};
pub use value::{Value, MAX_SIGNIFICANT_DIGITS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_a_sequenced_arithmetic_program() {
        let mut doc = parse_text(r#"{"counter": 10}"#).unwrap();
        let patch = Patch::from_json_text(
            r#"[
                {"op": "number/sub", "path": "/counter", "value": 3},
                {"op": "number/mul", "path": "/counter", "value": 2}
            ]"#,
        )
        .unwrap();
        patch.apply(&mut doc).unwrap();
        assert_eq!(render_text(&doc), r#"{"counter":14}"#);
    }

    #[test]
    fn conditional_branch_selects_the_true_arm() {
        let mut doc = parse_text(r#"{"flag": true, "value": 1}"#).unwrap();
        let patch = Patch::from_json_text(
            r#"[{
                "op": "ctrl/cond-apply-patch",
                "path": "",
                "check-path": "/flag",
                "patch": [{"op": "replace", "path": "/value", "value": 99}]
            }]"#,
        )
        .unwrap();
        patch.apply(&mut doc).unwrap();
        assert_eq!(render_text(&doc), r#"{"flag":true,"value":99}"#);
    }

    #[test]
    fn for_loop_accumulates_into_a_counter() {
        let mut doc = parse_text(r#"{"sum": 0, "i": null}"#).unwrap();
        let patch = Patch::from_json_text(
            r#"[{
                "op": "ctrl/for-loop",
                "path": "",
                "start-value": 1,
                "stop-value": 3,
                "counter-path": "/i",
                "patch": [{"op": "number/add", "path": "/sum", "value-path": "/i"}]
            }]"#,
        )
        .unwrap();
        patch.apply(&mut doc).unwrap();
        assert_eq!(render_text(&doc), r#"{"sum":6,"i":null}"#);
    }

    #[test]
    fn while_loop_runs_its_body_at_least_once() {
        let mut doc = parse_text(r#"{"n": 0, "done": true}"#).unwrap();
        let patch = Patch::from_json_text(
            r#"[{
                "op": "ctrl/while-loop",
                "path": "",
                "check-path": "/done",
                "patch": [
                    {"op": "number/add", "path": "/n", "value": 1},
                    {"op": "bool/not", "path": "/done", "value": true}
                ]
            }]"#,
        )
        .unwrap();
        patch.apply(&mut doc).unwrap();
        assert_eq!(render_text(&doc), r#"{"n":1,"done":false}"#);
    }
}
