//! The tagged JSON value model (spec §3, §4.A).
//!
//! `Value` is the in-memory representation both the "code" (op
//! descriptors) and the "data" of a running patch are made of. Numbers
//! are exact decimals rather than floats, so arithmetic never drifts and
//! equality is never surprising across `1` and `1.0`.

use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::RuntimeError;

/// Default precision `jotvm`'s `decimal.Context(prec=28, rounding=ROUND_HALF_EVEN)`
/// used; `rust_decimal::Decimal` enforces the same bound (a 96-bit
/// mantissa holds 28-29 significant digits) and rounds half-to-even on
/// every operation, so no explicit context object needs to be threaded
/// through arithmetic calls the way the Python original did.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 28;

/// A JSON value: exactly one of the six RFC 8259 kinds (spec §3).
///
/// Containers own their children outright — cloning a `Value` always
/// deep-clones, so the operand resolver (§4.C) and `move`/`copy` can
/// hand out owned copies without the caller worrying about aliasing.
#[derive(Debug, Clone)]
pub enum Value {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// An exact decimal number, bounded to [`MAX_SIGNIFICANT_DIGITS`].
    Number(Decimal),
    /// Unicode text.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered mapping from string keys to values; insertion order is
    /// preserved for deterministic serialization.
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Build an empty object — the starting point for call frames.
    pub fn empty_object() -> Value {
        Value::Object(IndexMap::new())
    }

    /// The kind's name, used to build `TypeError` messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Construct a `Number` from a decimal literal's text, rejecting
    /// anything that wouldn't survive the round trip (spec §4.A:
    /// "Numbers never hold NaN/Inf").
    pub fn number_from_str(text: &str) -> Result<Value, RuntimeError> {
        let parsed: Decimal = text.parse().map_err(|_| RuntimeError::ValueError {
            reason: format!("`{text}` is not a valid exact-decimal literal"),
        })?;
        Ok(Value::Number(parsed))
    }

    /// Construct a `Number` from a native Rust float. Only permitted when
    /// `require_decimal` is `false` (spec §4.A, §6) — the core VM always
    /// parses decimal literals from JSON text instead.
    pub fn number_from_f64(x: f64, require_decimal: bool) -> Result<Value, RuntimeError> {
        if require_decimal {
            return Err(RuntimeError::ValueError {
                reason: "require_decimal is set; construct numbers from decimal literals, not floats".into(),
            });
        }
        if !x.is_finite() {
            return Err(RuntimeError::ValueError {
                reason: format!("{x} is not finite"),
            });
        }
        let parsed = Decimal::from_f64_retain(x).ok_or_else(|| RuntimeError::ValueError {
            reason: format!("{x} has no exact decimal representation"),
        })?;
        Ok(Value::Number(parsed))
    }

    /// Typed accessors, mirroring `jotvm.utils.ensure_*`. Each fails with
    /// `TypeError` naming `op` and `field` so the message points at the
    /// offending operand.
    pub fn ensure_number(&self, op: &str, field: &str) -> Result<Decimal, RuntimeError> {
        match self {
            Value::Number(d) => Ok(*d),
            other => Err(type_error(op, field, "number", other)),
        }
    }

    /// See [`Value::ensure_number`].
    pub fn ensure_bool(&self, op: &str, field: &str) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error(op, field, "bool", other)),
        }
    }

    /// See [`Value::ensure_number`].
    pub fn ensure_string(&self, op: &str, field: &str) -> Result<&str, RuntimeError> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            other => Err(type_error(op, field, "string", other)),
        }
    }

    /// See [`Value::ensure_number`].
    pub fn ensure_array(&self, op: &str, field: &str) -> Result<&[Value], RuntimeError> {
        match self {
            Value::Array(a) => Ok(a.as_slice()),
            other => Err(type_error(op, field, "array", other)),
        }
    }

    /// See [`Value::ensure_number`].
    pub fn ensure_object(&self, op: &str, field: &str) -> Result<&IndexMap<String, Value>, RuntimeError> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(type_error(op, field, "object", other)),
        }
    }

    /// Container mutators used by the pointer layer (§4.B).
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// See [`Value::as_object_mut`].
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    // ---- numeric operations (spec §4.A) ----
    // Each returns a *new* Number and fails with NumericError when the
    // result would overflow Decimal's 28-29 digit range. Boolean
    // operators below are restricted to Bool operands by construction —
    // callers must `ensure_bool` first.

    /// `number/add` and the `+` used internally by `for-loop` stepping.
    pub fn num_add(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_add(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// `number/sub`.
    pub fn num_sub(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_sub(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// `number/mul`.
    pub fn num_mul(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_mul(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// `number/div`.
    pub fn num_div(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_div(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// Floored integer division. Not wired to an opcode (spec §4.D names
    /// no `number/floor-div` op) but kept on the value model per §4.A's
    /// description of the numeric surface.
    pub fn num_floor_div(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        if b.is_zero() {
            return Err(numeric_overflow(op));
        }
        Ok(Value::Number((a / b).floor()))
    }

    /// Remainder. See [`Value::num_floor_div`] — value-model-only, no opcode.
    pub fn num_mod(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_rem(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// Power. See [`Value::num_floor_div`] — value-model-only, no opcode.
    pub fn num_pow(op: &str, a: Decimal, b: Decimal) -> Result<Value, RuntimeError> {
        a.checked_powd(b).map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// `number/trunc`.
    pub fn num_trunc(_op: &str, a: Decimal) -> Result<Value, RuntimeError> {
        Ok(Value::Number(a.trunc()))
    }

    /// `number/sqrt`.
    pub fn num_sqrt(op: &str, a: Decimal) -> Result<Value, RuntimeError> {
        a.sqrt().map(Value::Number).ok_or_else(|| numeric_overflow(op))
    }

    /// `number/sin`. `rust_decimal`'s `maths` feature doesn't expose
    /// trigonometric functions directly, so we round-trip through `f64`
    /// and re-parse, which is sufficient precision for this operator's
    /// intended use (it's not on the exactness-critical path the way
    /// `add`/`sub`/`mul` are).
    pub fn num_sin(op: &str, a: Decimal) -> Result<Value, RuntimeError> {
        decimal_via_f64(op, a, f64::sin)
    }

    /// `number/cos`. See [`Value::num_sin`].
    pub fn num_cos(op: &str, a: Decimal) -> Result<Value, RuntimeError> {
        decimal_via_f64(op, a, f64::cos)
    }

    // ---- boolean operations (spec §4.A) ----

    /// `bool/not`.
    pub fn bool_not(a: bool) -> Value {
        Value::Bool(!a)
    }

    /// `bool/and`.
    pub fn bool_and(a: bool, b: bool) -> Value {
        Value::Bool(a && b)
    }

    /// `bool/or`.
    pub fn bool_or(a: bool, b: bool) -> Value {
        Value::Bool(a || b)
    }

    /// Kept on the value model alongside `and`/`or`/`not` per §4.A even
    /// though no `bool/xor` opcode is wired in §4.D.
    pub fn bool_xor(a: bool, b: bool) -> Value {
        Value::Bool(a ^ b)
    }

    // ---- relations (spec §4.A, §4.D) ----

    /// Ordering is only defined Number↔Number; anything else is a
    /// `TypeError` (spec §4.A).
    pub fn num_cmp(op: &str, left: &Value, right: &Value) -> Result<std::cmp::Ordering, RuntimeError> {
        let l = left.ensure_number(op, "left-value")?;
        let r = right.ensure_number(op, "right-value")?;
        Ok(l.cmp(&r))
    }
}

fn decimal_via_f64(op: &str, a: Decimal, f: impl Fn(f64) -> f64) -> Result<Value, RuntimeError> {
    use rust_decimal::prelude::ToPrimitive;
    let x = a.to_f64().ok_or_else(|| numeric_overflow(op))?;
    let y = f(x);
    if !y.is_finite() {
        return Err(numeric_overflow(op));
    }
    Decimal::from_f64_retain(y).map(Value::Number).ok_or_else(|| numeric_overflow(op))
}

fn numeric_overflow(op: &str) -> RuntimeError {
    RuntimeError::NumericError {
        op: op.to_string(),
        reason: "result is non-finite or exceeds available precision".to_string(),
    }
}

fn type_error(op: &str, field: &str, expected: &'static str, found: &Value) -> RuntimeError {
    RuntimeError::TypeError {
        op: op.to_string(),
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::json_io::render_text(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural_and_order_independent_for_objects() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), Value::Number(1.into()));
        a.insert("y".to_string(), Value::Number(2.into()));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), Value::Number(2.into()));
        b.insert("x".to_string(), Value::Number(1.into()));
        assert_eq!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn banker_rounding_matches_decimal_default() {
        // Decimal arithmetic's half-to-even rounding is exercised through
        // division, which is where a rounding mode is actually visible.
        let ten = Decimal::from(10);
        let three = Decimal::from(3);
        let result = Value::num_div("number/div", ten, three).unwrap();
        match result {
            Value::Number(d) => assert_eq!(d.scale() > 0, true),
            _ => panic!("expected a number"),
        }
    }

    #[test]
    fn ensure_number_reports_the_offending_field() {
        let err = Value::String("nope".into()).ensure_number("number/add", "value").unwrap_err();
        match err {
            RuntimeError::TypeError { op, field, expected, found } => {
                assert_eq!(op, "number/add");
                assert_eq!(field, "value");
                assert_eq!(expected, "number");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sqrt_and_trunc_behave() {
        let four = Decimal::from(4);
        assert_eq!(Value::num_sqrt("number/sqrt", four).unwrap(), Value::Number(Decimal::from(2)));
        let pi_ish: Decimal = "3.7".parse().unwrap();
        assert_eq!(Value::num_trunc("number/trunc", pi_ish).unwrap(), Value::Number(Decimal::from(3)));
    }

    #[test]
    fn boolean_operators() {
        assert_eq!(Value::bool_and(true, false), Value::Bool(false));
        assert_eq!(Value::bool_or(true, false), Value::Bool(true));
        assert_eq!(Value::bool_not(true), Value::Bool(false));
    }
}
