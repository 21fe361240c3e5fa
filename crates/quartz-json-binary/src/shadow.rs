//! Shadow-copy mutation of a container.
//!
//! These operations never touch the original document. The caller
//! seeds a destination buffer with the original bytes; the container
//! then patches only the affected entry, payload, and header bytes in
//! the destination. Readers of the original stay valid until the
//! caller swaps buffers.

use quartz_json_dom::JsonValue;

use crate::constants::*;
use crate::error::BinaryError;
use crate::reader::{read_varlen, BinContainer};
use crate::writer::{encode_value, inline_value};

/// The byte range `[start, end)` of an element's out-of-line payload,
/// relative to the container start. `None` for inlined elements.
pub fn payload_extent(
    container: &BinContainer<'_>,
    index: usize,
) -> Result<Option<(usize, usize)>, BinaryError> {
    let doc = container.doc();
    let entry = container.value_entry_pos(index);
    let type_byte = *doc.get(entry).ok_or(BinaryError::Truncated)?;
    let inlined = match type_byte {
        TYPE_LITERAL | TYPE_INT16 | TYPE_UINT16 => true,
        TYPE_INT32 | TYPE_UINT32 => container.large_format(),
        _ => false,
    };
    if inlined {
        return Ok(None);
    }
    let off_size = offset_size(container.large_format());
    let rel = if container.large_format() {
        u32::from_le_bytes(
            doc.get(entry + 1..entry + 1 + off_size)
                .ok_or(BinaryError::Truncated)?
                .try_into()
                .unwrap(),
        ) as usize
    } else {
        u16::from_le_bytes(
            doc.get(entry + 1..entry + 1 + off_size)
                .ok_or(BinaryError::Truncated)?
                .try_into()
                .unwrap(),
        ) as usize
    };
    let abs = container.container_pos() + rel;
    let size = payload_size(doc, type_byte, abs, container.large_format())?;
    Ok(Some((rel, rel + size)))
}

/// Bytes occupied by a non-inlined payload starting at `pos`.
fn payload_size(doc: &[u8], type_byte: u8, pos: usize, _large: bool) -> Result<usize, BinaryError> {
    match type_byte {
        TYPE_LITERAL => Ok(1),
        TYPE_INT16 | TYPE_UINT16 => Ok(2),
        TYPE_INT32 | TYPE_UINT32 => Ok(4),
        TYPE_INT64 | TYPE_UINT64 | TYPE_DOUBLE => Ok(8),
        TYPE_STRING => {
            let (len, prefix) = read_varlen(doc, pos)?;
            Ok(prefix + len)
        }
        TYPE_OPAQUE => {
            let (len, prefix) = read_varlen(doc, pos + 1)?;
            Ok(1 + prefix + len)
        }
        TYPE_SMALL_OBJECT | TYPE_SMALL_ARRAY => {
            let bytes = doc
                .get(pos + 2..pos + 4)
                .ok_or(BinaryError::Truncated)?;
            Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as usize)
        }
        TYPE_LARGE_OBJECT | TYPE_LARGE_ARRAY => {
            let bytes = doc
                .get(pos + 4..pos + 8)
                .ok_or(BinaryError::Truncated)?;
            Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
        }
        other => Err(BinaryError::InvalidTypeByte(other)),
    }
}

impl<'a> BinContainer<'a> {
    /// Byte ranges in use, relative to the container start: the
    /// header and entry tables, the key bytes, and every element
    /// payload except `skip`.
    fn used_intervals(&self, skip: usize) -> Result<Vec<(usize, usize)>, BinaryError> {
        let mut used = vec![(0, self.entries_end() - self.container_pos())];
        if self.is_object() {
            let off_size = offset_size(self.large_format());
            for i in 0..self.element_count() {
                let at = self.key_entry_pos(i);
                let key_offset =
                    crate::reader::read_offset(self.doc(), at, self.large_format())?;
                let key_len = crate::reader::read_u16(self.doc(), at + off_size)? as usize;
                used.push((key_offset, key_offset + key_len));
            }
        }
        for i in 0..self.element_count() {
            if i == skip {
                continue;
            }
            if let Some(extent) = payload_extent(self, i)? {
                used.push(extent);
            }
        }
        used.sort_unstable();
        Ok(used)
    }

    /// Can `needed` contiguous bytes be claimed for the element at
    /// `index`? Prefers the element's current payload location and
    /// falls back to the free region after all used bytes. Returns
    /// the data offset (relative to the container start) to write at.
    pub fn has_space(&self, index: usize, needed: usize) -> Result<Option<usize>, BinaryError> {
        let used = self.used_intervals(index)?;
        let candidate = match payload_extent(self, index)? {
            Some((start, _)) => start,
            None => used.iter().map(|&(_, end)| end).max().unwrap_or(0),
        };
        if candidate + needed > self.byte_size() {
            return Ok(None);
        }
        let fits = used
            .iter()
            .all(|&(start, end)| candidate + needed <= start || candidate >= end);
        Ok(if fits { Some(candidate) } else { None })
    }

    /// Write `new_value` into the element slot at `index` in the
    /// shadow buffer. `data_offset` must come from [`Self::has_space`]
    /// when the value does not inline.
    pub fn update_in_shadow(
        &self,
        dest: &mut [u8],
        index: usize,
        new_value: &JsonValue,
        data_offset: usize,
    ) -> Result<(), BinaryError> {
        let entry = self.value_entry_pos(index);
        let off_size = offset_size(self.large_format());
        if let Some((type_byte, bits)) = inline_value(new_value, self.large_format()) {
            dest[entry] = type_byte;
            if self.large_format() {
                dest[entry + 1..entry + 5].copy_from_slice(&bits.to_le_bytes());
            } else {
                dest[entry + 1..entry + 3].copy_from_slice(&(bits as u16).to_le_bytes());
            }
            return Ok(());
        }
        let (type_byte, payload) = encode_value(new_value, 1)?;
        let abs = self.container_pos() + data_offset;
        dest[abs..abs + payload.len()].copy_from_slice(&payload);
        dest[entry] = type_byte;
        if self.large_format() {
            dest[entry + 1..entry + 1 + off_size]
                .copy_from_slice(&(data_offset as u32).to_le_bytes());
        } else {
            dest[entry + 1..entry + 1 + off_size]
                .copy_from_slice(&(data_offset as u16).to_le_bytes());
        }
        Ok(())
    }

    /// Remove the element at `index` in the shadow buffer: the entry
    /// tables are compacted and the element count decremented. Freed
    /// key and payload bytes stay behind as free space; the container
    /// keeps its byte size so offsets into the tail remain valid.
    pub fn remove_in_shadow(&self, dest: &mut [u8], index: usize) -> Result<(), BinaryError> {
        let count = self.element_count();
        if index >= count {
            return Err(BinaryError::Corrupt("element index out of range"));
        }
        let large = self.large_format();
        let kes = key_entry_size(large);
        let ves = value_entry_size(large);
        let off_size = offset_size(large);
        let doc = self.doc();

        // Gather the surviving entries from the original, then write
        // them back contiguously for the reduced count.
        let tables_start = self.container_pos() + 2 * off_size;
        let mut tables: Vec<u8> = Vec::with_capacity((count - 1) * (kes + ves));
        if self.is_object() {
            for i in 0..count {
                if i == index {
                    continue;
                }
                let at = self.key_entry_pos(i);
                tables.extend_from_slice(
                    doc.get(at..at + kes).ok_or(BinaryError::Truncated)?,
                );
            }
        }
        for i in 0..count {
            if i == index {
                continue;
            }
            let at = self.value_entry_pos(i);
            tables.extend_from_slice(doc.get(at..at + ves).ok_or(BinaryError::Truncated)?);
        }
        dest[tables_start..tables_start + tables.len()].copy_from_slice(&tables);

        let new_count = count - 1;
        let count_pos = self.container_pos();
        if large {
            dest[count_pos..count_pos + 4].copy_from_slice(&(new_count as u32).to_le_bytes());
        } else {
            dest[count_pos..count_pos + 2].copy_from_slice(&(new_count as u16).to_le_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::to_dom;
    use crate::reader::{parse_binary, BinValue};
    use crate::writer::{serialize, space_needed};
    use quartz_json_dom::{parse_text, serialize_text, JsonValue};

    fn bin(text: &str) -> Vec<u8> {
        serialize(&parse_text(text.as_bytes(), false).unwrap()).unwrap()
    }

    fn container(doc: &[u8]) -> BinContainer<'_> {
        match parse_binary(doc).unwrap() {
            BinValue::Array(c) | BinValue::Object(c) => c,
            other => panic!("not a container: {other:?}"),
        }
    }

    #[test]
    fn update_smaller_string_in_place() {
        let original = bin(r#"["abcdef", 1]"#);
        let parent = container(&original);
        let new_value = JsonValue::Str("xy".into());
        let needed = space_needed(&new_value, parent.large_format()).unwrap();
        let offset = parent.has_space(0, needed).unwrap().expect("fits");

        let mut dest = original.clone();
        parent.update_in_shadow(&mut dest, 0, &new_value, offset).unwrap();

        assert_eq!(dest.len(), original.len());
        let updated = to_dom(&parse_binary(&dest).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), r#"["xy", 1]"#);
        // The original is untouched.
        let untouched = to_dom(&parse_binary(&original).unwrap()).unwrap();
        assert_eq!(serialize_text(&untouched), r#"["abcdef", 1]"#);
    }

    #[test]
    fn update_declines_on_growth() {
        let original = bin(r#"[1]"#);
        let parent = container(&original);
        let new_value = JsonValue::Str("a-long-string-that-needs-more-bytes".into());
        let needed = space_needed(&new_value, parent.large_format()).unwrap();
        assert!(parent.has_space(0, needed).unwrap().is_none());
    }

    #[test]
    fn update_inline_value_touches_only_the_entry() {
        let original = bin(r#"[500, "keep"]"#);
        let parent = container(&original);
        let new_value = JsonValue::Int(7);
        assert_eq!(space_needed(&new_value, parent.large_format()).unwrap(), 0);

        let mut dest = original.clone();
        parent.update_in_shadow(&mut dest, 0, &new_value, 0).unwrap();
        let updated = to_dom(&parse_binary(&dest).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), r#"[7, "keep"]"#);
    }

    #[test]
    fn freed_space_is_reusable() {
        // Replace a long string with a short one, then grow the short
        // one back within the freed extent.
        let original = bin(r#"["abcdefghij"]"#);
        let parent = container(&original);

        let short = JsonValue::Str("x".into());
        let offset = parent
            .has_space(0, space_needed(&short, false).unwrap())
            .unwrap()
            .unwrap();
        let mut step1 = original.clone();
        parent.update_in_shadow(&mut step1, 0, &short, offset).unwrap();

        let parent1 = container(&step1);
        let medium = JsonValue::Str("abcde".into());
        let needed = space_needed(&medium, false).unwrap();
        let offset = parent1.has_space(0, needed).unwrap().expect("freed space");
        let mut step2 = step1.clone();
        parent1.update_in_shadow(&mut step2, 0, &medium, offset).unwrap();

        let updated = to_dom(&parse_binary(&step2).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), r#"["abcde"]"#);
    }

    #[test]
    fn remove_array_cell() {
        let original = bin(r#"[1, "two", 3]"#);
        let parent = container(&original);
        let mut dest = original.clone();
        parent.remove_in_shadow(&mut dest, 1).unwrap();

        assert_eq!(dest.len(), original.len());
        let updated = to_dom(&parse_binary(&dest).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), "[1, 3]");
    }

    #[test]
    fn remove_object_member() {
        let original = bin(r#"{"a": 1, "bb": "x", "ccc": true}"#);
        let parent = container(&original);
        let index = parent.lookup_index(b"bb").unwrap().unwrap();
        let mut dest = original.clone();
        parent.remove_in_shadow(&mut dest, index).unwrap();

        let updated = to_dom(&parse_binary(&dest).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), r#"{"a": 1, "ccc": true}"#);
    }

    #[test]
    fn update_after_remove_reuses_freed_bytes() {
        let original = bin(r#"["abc", "defgh"]"#);
        let parent = container(&original);
        let mut dest = original.clone();
        parent.remove_in_shadow(&mut dest, 1).unwrap();

        let parent1 = container(&dest);
        let bigger = JsonValue::Str("abcdefgh".into());
        let needed = space_needed(&bigger, false).unwrap();
        let offset = parent1.has_space(0, needed).unwrap().expect("space freed by remove");
        let mut dest2 = dest.clone();
        parent1.update_in_shadow(&mut dest2, 0, &bigger, offset).unwrap();

        let updated = to_dom(&parse_binary(&dest2).unwrap()).unwrap();
        assert_eq!(serialize_text(&updated), r#"["abcdefgh"]"#);
    }
}
