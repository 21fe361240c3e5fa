//! Binary to DOM materialization.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use quartz_json_dom::{
    FieldType, JsonArray, JsonObject, JsonValue, OpaqueValue, PackedTemporal, MAX_DEPTH,
    PACKED_SIZE,
};

use crate::error::BinaryError;
use crate::reader::BinValue;

/// Build a DOM from a binary value. Opaque decimal and temporal
/// payloads surface as their logical kinds.
pub fn to_dom(value: &BinValue<'_>) -> Result<JsonValue, BinaryError> {
    to_dom_at(value, 1)
}

fn to_dom_at(value: &BinValue<'_>, depth: usize) -> Result<JsonValue, BinaryError> {
    if depth > MAX_DEPTH {
        return Err(BinaryError::TooDeep);
    }
    match value {
        BinValue::Null => Ok(JsonValue::Null),
        BinValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        BinValue::Int(i) => Ok(JsonValue::Int(*i)),
        BinValue::Uint(u) => Ok(JsonValue::Uint(*u)),
        BinValue::Double(d) => Ok(JsonValue::Double(*d)),
        BinValue::String(s) => {
            let s = std::str::from_utf8(s)
                .map_err(|_| BinaryError::Corrupt("invalid utf-8 in string"))?;
            Ok(JsonValue::Str(s.to_string()))
        }
        BinValue::Opaque { field_type, data } => unpack_opaque(*field_type, data),
        BinValue::Array(c) => {
            let mut arr = JsonArray::new();
            for i in 0..c.element_count() {
                arr.append_alias(to_dom_at(&c.element(i)?, depth + 1)?);
            }
            Ok(JsonValue::Array(arr))
        }
        BinValue::Object(c) => {
            let mut obj = JsonObject::new();
            for i in 0..c.element_count() {
                let key = std::str::from_utf8(c.key(i)?)
                    .map_err(|_| BinaryError::Corrupt("invalid utf-8 in key"))?;
                obj.add_alias(key, to_dom_at(&c.element(i)?, depth + 1)?);
            }
            Ok(JsonValue::Object(obj))
        }
    }
}

fn unpack_opaque(field_type: FieldType, data: &[u8]) -> Result<JsonValue, BinaryError> {
    match field_type {
        FieldType::DECIMAL => {
            let text = std::str::from_utf8(data)
                .map_err(|_| BinaryError::Corrupt("invalid decimal payload"))?;
            let dec = BigDecimal::from_str(text)
                .map_err(|_| BinaryError::Corrupt("invalid decimal payload"))?;
            Ok(JsonValue::Decimal(dec))
        }
        FieldType::DATE | FieldType::TIME | FieldType::DATETIME | FieldType::TIMESTAMP => {
            let bytes: [u8; PACKED_SIZE] = data
                .try_into()
                .map_err(|_| BinaryError::Corrupt("invalid temporal payload"))?;
            let packed = PackedTemporal::from_le_bytes(bytes);
            Ok(match field_type {
                FieldType::DATE => JsonValue::Date(packed),
                FieldType::TIME => JsonValue::Time(packed),
                FieldType::DATETIME => JsonValue::Datetime(packed),
                _ => JsonValue::Timestamp(packed),
            })
        }
        other => Ok(JsonValue::Opaque(OpaqueValue {
            field_type: other,
            data: data.to_vec(),
        })),
    }
}
