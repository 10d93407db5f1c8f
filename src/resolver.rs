//! Operand resolution: every operand named `F` may be supplied either
//! literally as field `F` in the op descriptor, or indirectly as
//! `F-path`, a JSON Pointer (relative to the running document) whose
//! value is read instead. The two are mutually exclusive.

use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::pointer::Pointer;
use crate::value::Value;

/// Resolve a mandatory operand named `field` from `fields` (the op's
/// descriptor) against `document` (the live document, so control ops'
/// self-modifying-program idiom works). Fails with `MissingField` if
/// neither `field` nor `{field}-path` is present, or with `Pointer` if
/// `{field}-path` doesn't resolve.
pub fn resolve_field(
    op: &str,
    field: &str,
    fields: &IndexMap<String, Value>,
    document: &Value,
) -> Result<Value, RuntimeError> {
    resolve_field_optional(op, field, fields, document)?.ok_or_else(|| RuntimeError::MissingField {
        op: op.to_string(),
        field: field.to_string(),
    })
}

/// As [`resolve_field`], but returns `Ok(None)` instead of
/// `MissingField` when the operand is entirely absent — used for
/// operands the caller falls back on the current document value for
/// (e.g. endomorphic unary ops' `value`/`value-path`).
pub fn resolve_field_optional(
    op: &str,
    field: &str,
    fields: &IndexMap<String, Value>,
    document: &Value,
) -> Result<Option<Value>, RuntimeError> {
    let path_field = format!("{field}-path");
    match (fields.get(field), fields.get(&path_field)) {
        (Some(_), Some(_)) => Err(RuntimeError::ValueError {
            reason: format!("op `{op}`: `{field}` and `{path_field}` are mutually exclusive"),
        }),
        (Some(literal), None) => Ok(Some(literal.clone())),
        (None, Some(path_value)) => {
            let text = path_value.ensure_string(op, path_field.as_str())?;
            let pointer = Pointer::parse(text).map_err(RuntimeError::Pointer)?;
            let resolved = pointer.get(document).map_err(RuntimeError::Pointer)?;
            Ok(Some(resolved.clone()))
        }
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(key: &str, value: Value) -> Value {
        let mut obj = IndexMap::new();
        obj.insert(key.to_string(), value);
        Value::Object(obj)
    }

    #[test]
    fn literal_field_wins_when_present() {
        let mut fields = IndexMap::new();
        fields.insert("value".to_string(), Value::Number(5.into()));
        let doc = Value::Null;
        let resolved = resolve_field("number/add", "value", &fields, &doc).unwrap();
        assert_eq!(resolved, Value::Number(5.into()));
    }

    #[test]
    fn path_field_dereferences_document() {
        let mut fields = IndexMap::new();
        fields.insert("value-path".to_string(), Value::String("/x".to_string()));
        let doc = doc_with("x", Value::Number(7.into()));
        let resolved = resolve_field("number/add", "value", &fields, &doc).unwrap();
        assert_eq!(resolved, Value::Number(7.into()));
    }

    #[test]
    fn both_present_is_an_error() {
        let mut fields = IndexMap::new();
        fields.insert("value".to_string(), Value::Number(1.into()));
        fields.insert("value-path".to_string(), Value::String("/x".to_string()));
        let doc = Value::Null;
        assert!(resolve_field("number/add", "value", &fields, &doc).is_err());
    }

    #[test]
    fn missing_required_field_errors() {
        let fields = IndexMap::new();
        let doc = Value::Null;
        let err = resolve_field("number/add", "value", &fields, &doc).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingField { .. }));
    }

    #[test]
    fn optional_missing_field_is_none() {
        let fields = IndexMap::new();
        let doc = Value::Null;
        assert_eq!(resolve_field_optional("number/trunc", "value", &fields, &doc).unwrap(), None);
    }
}
