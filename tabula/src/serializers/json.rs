//! JSON serialization of value snapshots

use crate::value::Value;
use crate::{TabulaError, TabulaResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Serialize snapshot rows to JSON bytes.
pub fn to_bytes(rows: &[Vec<Value>]) -> TabulaResult<Vec<u8>> {
    serde_json::to_vec(rows)
        .map_err(|e| TabulaError::Engine(format!("serialization failed: {}", e)))
}

/// Deserialize snapshot rows from JSON bytes. Integers stay integers;
/// any other number becomes a decimal.
pub fn from_bytes(bytes: &[u8]) -> TabulaResult<Vec<Vec<Value>>> {
    let raw: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| TabulaError::Engine(format!("deserialization failed: {}", e)))?;
    let rows = raw
        .as_array()
        .ok_or_else(|| TabulaError::Engine("expected an array of rows".to_string()))?;
    rows.iter()
        .map(|row| {
            let cells = row
                .as_array()
                .ok_or_else(|| TabulaError::Engine("expected an array of cells".to_string()))?;
            cells.iter().map(value_from_json).collect()
        })
        .collect()
}

/// Convert a JSON value into an engine value.
pub fn value_from_json(value: &serde_json::Value) -> TabulaResult<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Value::Int(i));
            }
            n.as_f64()
                .and_then(Decimal::from_f64)
                .map(Value::Number)
                .ok_or_else(|| TabulaError::Engine(format!("number {} out of range", n)))
        }
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_from_json)
            .collect::<TabulaResult<Vec<_>>>()
            .map(Value::List),
        serde_json::Value::Object(entries) => entries
            .iter()
            .map(|(k, v)| Ok((Value::Text(k.clone()), value_from_json(v)?)))
            .collect::<TabulaResult<Vec<_>>>()
            .map(Value::Map),
    }
}
