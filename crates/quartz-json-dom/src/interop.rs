//! Conversions between the DOM and `serde_json` values.
//!
//! Hosts and tests frequently already hold a `serde_json::Value`;
//! these conversions bridge it to the column core's richer kind set.
//! Kinds JSON cannot express (decimals, temporals, opaques) render to
//! strings on the way out, exactly as text serialization prints them.

use std::convert::Infallible;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use crate::temporal::{format_temporal, TemporalKind};
use crate::value::{FieldType, JsonArray, JsonObject, JsonValue};

impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    JsonValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    JsonValue::Uint(u)
                } else {
                    JsonValue::Double(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => JsonValue::Str(s),
            Value::Array(elems) => {
                let mut arr = JsonArray::new();
                for elem in elems {
                    arr.append_alias(JsonValue::from(elem));
                }
                JsonValue::Array(arr)
            }
            Value::Object(map) => {
                let mut obj = JsonObject::new();
                for (k, v) in map {
                    obj.add_alias(k, JsonValue::from(v));
                }
                JsonValue::Object(obj)
            }
        }
    }
}

impl TryFrom<&JsonValue> for Value {
    type Error = Infallible;

    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        Ok(to_serde_value(value))
    }
}

/// Convert a DOM to a `serde_json` value.
pub fn to_serde_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Int(i) => Value::from(*i),
        JsonValue::Uint(u) => Value::from(*u),
        JsonValue::Double(d) => Value::from(*d),
        JsonValue::Decimal(d) => Value::String(d.to_string()),
        JsonValue::Str(s) => Value::String(s.clone()),
        JsonValue::Date(p) => Value::String(format_temporal(TemporalKind::Date, *p)),
        JsonValue::Time(p) => Value::String(format_temporal(TemporalKind::Time, *p)),
        JsonValue::Datetime(p) => Value::String(format_temporal(TemporalKind::Datetime, *p)),
        JsonValue::Timestamp(p) => Value::String(format_temporal(TemporalKind::Timestamp, *p)),
        JsonValue::Opaque(op) => {
            let FieldType(code) = op.field_type;
            Value::String(format!("base64:type{}:{}", code, BASE64.encode(&op.data)))
        }
        JsonValue::Array(arr) => Value::Array(arr.iter().map(to_serde_value).collect()),
        JsonValue::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.to_string(), to_serde_value(v)))
                .collect(),
        ),
    }
}
