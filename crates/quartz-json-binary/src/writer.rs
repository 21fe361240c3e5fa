//! DOM to binary serialization.
//!
//! Each container is laid out in the small encoding first and
//! re-laid out in the large encoding only when a count, size, or
//! offset does not fit in 16 bits. The encoding also decides which
//! scalars inline into the entry table: literals and 16-bit integers
//! always, 32-bit integers only in the large encoding.

use quartz_json_dom::{FieldType, JsonValue, OpaqueValue, MAX_DEPTH};

use crate::constants::*;
use crate::error::BinaryError;
use crate::reader::BinValue;

/// Serialize a DOM into a standalone binary document.
pub fn serialize(value: &JsonValue) -> Result<Vec<u8>, BinaryError> {
    let mut out = Vec::new();
    let (type_byte, payload) = encode_value(value, 1)?;
    out.push(type_byte);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Append a variable-length size prefix.
pub fn write_varlen(out: &mut Vec<u8>, mut len: usize) {
    loop {
        let byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// The inline form of a value in a parent of the given encoding, if
/// it has one. Returns the entry's type byte and the bits stored in
/// the offset field.
pub fn inline_value(value: &JsonValue, large: bool) -> Option<(u8, u32)> {
    match value {
        JsonValue::Null => Some((TYPE_LITERAL, LITERAL_NULL as u32)),
        JsonValue::Bool(true) => Some((TYPE_LITERAL, LITERAL_TRUE as u32)),
        JsonValue::Bool(false) => Some((TYPE_LITERAL, LITERAL_FALSE as u32)),
        JsonValue::Int(i) => {
            if let Ok(small) = i16::try_from(*i) {
                Some((TYPE_INT16, small as u16 as u32))
            } else if large {
                i32::try_from(*i).ok().map(|v| (TYPE_INT32, v as u32))
            } else {
                None
            }
        }
        JsonValue::Uint(u) => {
            if let Ok(small) = u16::try_from(*u) {
                Some((TYPE_UINT16, small as u32))
            } else if large {
                u32::try_from(*u).ok().map(|v| (TYPE_UINT32, v))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Bytes required to store `value` as an element of a container with
/// the given encoding: zero when it inlines, the payload size
/// otherwise.
pub fn space_needed(value: &JsonValue, large: bool) -> Result<usize, BinaryError> {
    if inline_value(value, large).is_some() {
        Ok(0)
    } else {
        Ok(encode_value(value, 1)?.1.len())
    }
}

/// Encode a value into its type byte and payload bytes (the payload
/// excludes the type byte, which lives in the parent's entry or at
/// document offset 0 for a root).
pub(crate) fn encode_value(value: &JsonValue, depth: usize) -> Result<(u8, Vec<u8>), BinaryError> {
    if depth > MAX_DEPTH {
        return Err(BinaryError::TooDeep);
    }
    match value {
        JsonValue::Null => Ok((TYPE_LITERAL, vec![LITERAL_NULL])),
        JsonValue::Bool(true) => Ok((TYPE_LITERAL, vec![LITERAL_TRUE])),
        JsonValue::Bool(false) => Ok((TYPE_LITERAL, vec![LITERAL_FALSE])),
        JsonValue::Int(i) => {
            if let Ok(v) = i16::try_from(*i) {
                Ok((TYPE_INT16, v.to_le_bytes().to_vec()))
            } else if let Ok(v) = i32::try_from(*i) {
                Ok((TYPE_INT32, v.to_le_bytes().to_vec()))
            } else {
                Ok((TYPE_INT64, i.to_le_bytes().to_vec()))
            }
        }
        JsonValue::Uint(u) => {
            if let Ok(v) = u16::try_from(*u) {
                Ok((TYPE_UINT16, v.to_le_bytes().to_vec()))
            } else if let Ok(v) = u32::try_from(*u) {
                Ok((TYPE_UINT32, v.to_le_bytes().to_vec()))
            } else {
                Ok((TYPE_UINT64, u.to_le_bytes().to_vec()))
            }
        }
        JsonValue::Double(d) => Ok((TYPE_DOUBLE, d.to_le_bytes().to_vec())),
        JsonValue::Str(s) => {
            let mut payload = Vec::with_capacity(s.len() + 1);
            write_varlen(&mut payload, s.len());
            payload.extend_from_slice(s.as_bytes());
            Ok((TYPE_STRING, payload))
        }
        JsonValue::Decimal(d) => {
            let text = d.to_string();
            Ok((TYPE_OPAQUE, opaque_payload(FieldType::DECIMAL, text.as_bytes())))
        }
        JsonValue::Date(p) => Ok((
            TYPE_OPAQUE,
            opaque_payload(FieldType::DATE, &p.to_le_bytes()),
        )),
        JsonValue::Time(p) => Ok((
            TYPE_OPAQUE,
            opaque_payload(FieldType::TIME, &p.to_le_bytes()),
        )),
        JsonValue::Datetime(p) => Ok((
            TYPE_OPAQUE,
            opaque_payload(FieldType::DATETIME, &p.to_le_bytes()),
        )),
        JsonValue::Timestamp(p) => Ok((
            TYPE_OPAQUE,
            opaque_payload(FieldType::TIMESTAMP, &p.to_le_bytes()),
        )),
        JsonValue::Opaque(OpaqueValue { field_type, data }) => {
            Ok((TYPE_OPAQUE, opaque_payload(*field_type, data)))
        }
        JsonValue::Array(_) | JsonValue::Object(_) => encode_container(value, depth),
    }
}

fn opaque_payload(field_type: FieldType, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(data.len() + 2);
    payload.push(field_type.0);
    write_varlen(&mut payload, data.len());
    payload.extend_from_slice(data);
    payload
}

/// A child of the container being laid out.
enum Slot {
    Inline { type_byte: u8, bits: u32 },
    Stored { type_byte: u8, payload: Vec<u8> },
}

fn encode_container(value: &JsonValue, depth: usize) -> Result<(u8, Vec<u8>), BinaryError> {
    match layout_container(value, depth, false)? {
        Some(payload) => {
            let type_byte = if matches!(value, JsonValue::Object(_)) {
                TYPE_SMALL_OBJECT
            } else {
                TYPE_SMALL_ARRAY
            };
            Ok((type_byte, payload))
        }
        None => {
            let payload = layout_container(value, depth, true)?
                .ok_or(BinaryError::Corrupt("container does not fit large encoding"))?;
            let type_byte = if matches!(value, JsonValue::Object(_)) {
                TYPE_LARGE_OBJECT
            } else {
                TYPE_LARGE_ARRAY
            };
            Ok((type_byte, payload))
        }
    }
}

/// Lay out a container in the requested encoding. Returns `None`
/// when the small encoding cannot hold it.
fn layout_container(
    value: &JsonValue,
    depth: usize,
    large: bool,
) -> Result<Option<Vec<u8>>, BinaryError> {
    let off = offset_size(large);
    let (keys, slots): (Vec<&str>, Vec<Slot>) = match value {
        JsonValue::Object(obj) => {
            let mut keys = Vec::with_capacity(obj.len());
            let mut slots = Vec::with_capacity(obj.len());
            for (key, child) in obj.iter() {
                if key.len() > u16::MAX as usize {
                    return Err(BinaryError::KeyTooLong);
                }
                keys.push(key);
                slots.push(encode_slot(child, depth, large)?);
            }
            (keys, slots)
        }
        JsonValue::Array(arr) => {
            let mut slots = Vec::with_capacity(arr.len());
            for child in arr.iter() {
                slots.push(encode_slot(child, depth, large)?);
            }
            (Vec::new(), slots)
        }
        _ => unreachable!(),
    };

    let count = slots.len();
    let header = 2 * off
        + keys.len() * key_entry_size(large)
        + count * value_entry_size(large);
    let keys_size: usize = keys.iter().map(|k| k.len()).sum();
    let values_size: usize = slots
        .iter()
        .map(|s| match s {
            Slot::Inline { .. } => 0,
            Slot::Stored { payload, .. } => payload.len(),
        })
        .sum();
    let total = header + keys_size + values_size;

    if !large && (total > u16::MAX as usize || count > u16::MAX as usize) {
        return Ok(None);
    }

    let mut out = Vec::with_capacity(total);
    push_offset(&mut out, count, large);
    push_offset(&mut out, total, large);

    // Key entries, then value entries, then key bytes, then payloads.
    let mut key_offset = header;
    for key in &keys {
        push_offset(&mut out, key_offset, large);
        out.extend_from_slice(&(key.len() as u16).to_le_bytes());
        key_offset += key.len();
    }
    let mut value_offset = header + keys_size;
    for slot in &slots {
        match slot {
            Slot::Inline { type_byte, bits } => {
                out.push(*type_byte);
                if large {
                    out.extend_from_slice(&bits.to_le_bytes());
                } else {
                    out.extend_from_slice(&(*bits as u16).to_le_bytes());
                }
            }
            Slot::Stored { type_byte, payload } => {
                out.push(*type_byte);
                push_offset(&mut out, value_offset, large);
                value_offset += payload.len();
            }
        }
    }
    for key in &keys {
        out.extend_from_slice(key.as_bytes());
    }
    for slot in &slots {
        if let Slot::Stored { payload, .. } = slot {
            out.extend_from_slice(payload);
        }
    }
    debug_assert_eq!(out.len(), total);
    Ok(Some(out))
}

fn encode_slot(child: &JsonValue, depth: usize, large: bool) -> Result<Slot, BinaryError> {
    if let Some((type_byte, bits)) = inline_value(child, large) {
        Ok(Slot::Inline { type_byte, bits })
    } else {
        let (type_byte, payload) = encode_value(child, depth + 1)?;
        Ok(Slot::Stored { type_byte, payload })
    }
}

fn push_offset(out: &mut Vec<u8>, value: usize, large: bool) {
    if large {
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(value as u16).to_le_bytes());
    }
}

/// Re-serialize a reader value as a standalone document. Containers
/// are self-contained byte ranges and copy directly; scalars
/// re-encode.
pub fn raw_binary(value: &BinValue<'_>, out: &mut Vec<u8>) {
    match value {
        BinValue::Null => {
            out.push(TYPE_LITERAL);
            out.push(LITERAL_NULL);
        }
        BinValue::Bool(b) => {
            out.push(TYPE_LITERAL);
            out.push(if *b { LITERAL_TRUE } else { LITERAL_FALSE });
        }
        BinValue::Int(i) => {
            let (type_byte, payload) =
                encode_value(&JsonValue::Int(*i), 1).expect("scalar encoding cannot fail");
            out.push(type_byte);
            out.extend_from_slice(&payload);
        }
        BinValue::Uint(u) => {
            let (type_byte, payload) =
                encode_value(&JsonValue::Uint(*u), 1).expect("scalar encoding cannot fail");
            out.push(type_byte);
            out.extend_from_slice(&payload);
        }
        BinValue::Double(d) => {
            out.push(TYPE_DOUBLE);
            out.extend_from_slice(&d.to_le_bytes());
        }
        BinValue::String(s) => {
            out.push(TYPE_STRING);
            write_varlen(out, s.len());
            out.extend_from_slice(s);
        }
        BinValue::Opaque { field_type, data } => {
            out.push(TYPE_OPAQUE);
            out.extend_from_slice(&opaque_payload(*field_type, data));
        }
        BinValue::Array(c) => {
            out.push(if c.large_format() {
                TYPE_LARGE_ARRAY
            } else {
                TYPE_SMALL_ARRAY
            });
            let start = c.container_pos();
            out.extend_from_slice(&c.doc()[start..start + c.byte_size()]);
        }
        BinValue::Object(c) => {
            out.push(if c.large_format() {
                TYPE_LARGE_OBJECT
            } else {
                TYPE_SMALL_OBJECT
            });
            let start = c.container_pos();
            out.extend_from_slice(&c.doc()[start..start + c.byte_size()]);
        }
    }
}
