//! Parsing and rendering JSON text.
//!
//! `serde_json` is used purely as the host-native interchange format:
//! it is configured with `arbitrary_precision` (so decimal literals
//! survive as exact digit strings instead of rounding through `f64`)
//! and `preserve_order` (so object keys come back in source order). The
//! conversion to/from this crate's [`Value`] is the only place
//! `serde_json::Value` appears.

use rust_decimal::Decimal;

use crate::error::RuntimeError;
use crate::value::Value;

/// Parse JSON text into a [`Value`], with exact decimal literals and
/// preserved object-key order.
pub fn parse_text(text: &str) -> Result<Value, RuntimeError> {
    let native: serde_json::Value = serde_json::from_str(text).map_err(|e| RuntimeError::ValueError {
        reason: format!("invalid JSON: {e}"),
    })?;
    from_native(&native)
}

/// Render a [`Value`] to compact JSON text.
pub fn render_text(value: &Value) -> String {
    let native = to_native(value);
    serde_json::to_string(&native).expect("Value -> serde_json::Value never fails to serialize")
}

/// Render a [`Value`] to indented JSON text, for human-facing output.
pub fn render_text_pretty(value: &Value) -> String {
    let native = to_native(value);
    serde_json::to_string_pretty(&native).expect("Value -> serde_json::Value never fails to serialize")
}

/// Convert a host-native `serde_json::Value` (as produced by
/// `serde_json::from_str` with `arbitrary_precision`) into this crate's
/// [`Value`]. Numbers are parsed as exact [`Decimal`]s; anything that
/// doesn't fit the 28-29 significant digit range is a [`RuntimeError::ValueError`].
pub fn from_native(native: &serde_json::Value) -> Result<Value, RuntimeError> {
    match native {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            let decimal: Decimal = n.to_string().parse().map_err(|_| RuntimeError::ValueError {
                reason: format!("`{n}` does not fit an exact decimal representation"),
            })?;
            Ok(Value::Number(decimal))
        }
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(items) => {
            let converted = items.iter().map(from_native).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(converted))
        }
        serde_json::Value::Object(map) => {
            let mut out = indexmap::IndexMap::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), from_native(v)?);
            }
            Ok(Value::Object(out))
        }
    }
}

/// The inverse of [`from_native`]. Numbers round-trip through their
/// canonical `Decimal` text so `1.50` and `1.5` keep whatever scale the
/// arithmetic left them at — no silent loss or gain of trailing-zero
/// precision.
pub fn to_native(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(d) => serde_json::Value::Number(
            d.to_string()
                .parse()
                .expect("Decimal's Display output is always a valid JSON number literal"),
        ),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_native).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                out.insert(k.clone(), to_native(v));
            }
            serde_json::Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_object_key_order() {
        let text = r#"{"z": 1, "a": 2, "m": 3}"#;
        let value = parse_text(text).unwrap();
        let obj = value.ensure_object("test", "value").unwrap();
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn preserves_exact_decimal_literal() {
        let value = parse_text("1.50").unwrap();
        assert_eq!(render_text(&value), "1.50");
    }

    #[test]
    fn render_round_trips_nested_structures() {
        let text = r#"{"a":[1,"two",true,null]}"#;
        let value = parse_text(text).unwrap();
        assert_eq!(render_text(&value), text);
    }
}
