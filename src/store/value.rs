// Typed document values -> plain JSON
//
// The REST API wraps every field in a single-key object naming its type:
//   {"permissions": {"mapValue": {"fields": {"canManageUsers": {"booleanValue": true}}}}}
// Integers arrive as strings to preserve 64-bit precision.

use serde_json::{Map, Number, Value};

use super::StoreError;

/// Decode a `fields` object into plain JSON
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(name, typed)| Ok((name.clone(), decode_value(typed)?)))
        .collect()
}

/// Decode one typed value
pub fn decode_value(typed: &Value) -> Result<Value, StoreError> {
    let object = typed
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected typed value object, got {}", typed)))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| StoreError::Decode(format!("booleanValue is not a boolean: {}", inner))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => decode_double(inner),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| StoreError::Decode(format!("{} is not a string: {}", kind, inner))),
        "geoPointValue" => Ok(inner.clone()),
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            // An empty map is serialized without `fields`
            None => Ok(Value::Object(Map::new())),
            Some(other) => Err(StoreError::Decode(format!("mapValue.fields is not an object: {}", other))),
        },
        "arrayValue" => match inner.get("values") {
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            None => Ok(Value::Array(Vec::new())),
            Some(other) => Err(StoreError::Decode(format!("arrayValue.values is not an array: {}", other))),
        },
        other => Err(StoreError::Decode(format!("unsupported value type '{}'", other))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value, StoreError> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|_| StoreError::Decode(format!("integerValue is not an integer: {}", s))),
        Value::Number(n) if n.is_i64() => Ok(Value::Number(n.clone())),
        other => Err(StoreError::Decode(format!("integerValue is not an integer: {}", other))),
    }
}

fn decode_double(inner: &Value) -> Result<Value, StoreError> {
    match inner {
        Value::Number(n) => Ok(Value::Number(n.clone())),
        // NaN and infinities are sent as strings and have no JSON number form
        Value::String(s) => Ok(s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        other => Err(StoreError::Decode(format!("doubleValue is not a number: {}", other))),
    }
}
