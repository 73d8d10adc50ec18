//! Scalar coercion between path/query components and JSON values.

use hermes_core::{DecodeError, FieldDescriptor, FieldKind};
use serde_json::{Number, Value};

/// Coerces one decoded component into the field's kind.
pub(crate) fn coerce(field: &FieldDescriptor, raw: &str) -> Result<Value, DecodeError> {
    match field.kind {
        FieldKind::String => Ok(Value::String(raw.to_string())),
        FieldKind::Integer(range) => {
            let n = raw.parse::<i128>().map_err(|_| {
                DecodeError::type_mismatch(field.name, format!("expected integer, got '{raw}'"))
            })?;
            if !range.contains(n) {
                return Err(DecodeError::type_mismatch(
                    field.name,
                    format!("{n} is outside {}..={}", range.min, range.max),
                ));
            }
            if let Ok(n) = u64::try_from(n) {
                Ok(Value::Number(n.into()))
            } else {
                i64::try_from(n).map(|n| Value::Number(n.into())).map_err(|_| {
                    DecodeError::type_mismatch(field.name, format!("{n} does not fit in 64 bits"))
                })
            }
        }
        FieldKind::Float => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                DecodeError::type_mismatch(field.name, format!("expected number, got '{raw}'"))
            }),
        FieldKind::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(DecodeError::type_mismatch(
                field.name,
                format!("expected true or false, got '{raw}'"),
            )),
        },
        FieldKind::Enum(members) => {
            if members.contains(&raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(DecodeError::type_mismatch(
                    field.name,
                    format!("expected one of {}, got '{raw}'", members.join(", ")),
                ))
            }
        }
        FieldKind::Structured => Err(DecodeError::type_mismatch(
            field.name,
            "structured values travel in the body",
        )),
    }
}

/// Renders a scalar value as a single component, or `None` for null.
///
/// Returns `Err(())` for arrays and objects.
pub(crate) fn render(value: &Value) -> Result<Option<String>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(()),
    }
}
