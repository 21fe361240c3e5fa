//! Structural merge of two DOM roots.

use crate::error::{DomError, MAX_DEPTH};
use crate::value::{JsonArray, JsonObject, JsonValue};

/// Merge two documents, consuming both.
///
/// Two objects merge pairwise: values under common keys merge
/// recursively, new keys transfer from the right side. Any other
/// combination wraps non-arrays into single-element arrays and
/// concatenates.
pub fn merge_doms(left: JsonValue, right: JsonValue) -> Result<JsonValue, DomError> {
    merge_at(left, right, 1)
}

fn merge_at(left: JsonValue, right: JsonValue, depth: usize) -> Result<JsonValue, DomError> {
    if depth > MAX_DEPTH {
        return Err(DomError::DepthExceeded { offset: 0 });
    }
    match (left, right) {
        (JsonValue::Object(l), JsonValue::Object(r)) => {
            Ok(JsonValue::Object(merge_objects(l, r, depth)?))
        }
        (left, right) => {
            let mut arr = into_array(left);
            arr.consume(into_array(right));
            Ok(JsonValue::Array(arr))
        }
    }
}

fn merge_objects(
    mut left: JsonObject,
    right: JsonObject,
    depth: usize,
) -> Result<JsonObject, DomError> {
    for (key, rv) in right {
        match left.take(&key) {
            Some(lv) => {
                let merged = merge_at(lv, rv, depth + 1)?;
                left.add_alias(key, merged);
            }
            None => left.add_alias(key, rv),
        }
    }
    Ok(left)
}

fn into_array(value: JsonValue) -> JsonArray {
    match value {
        JsonValue::Array(arr) => arr,
        other => {
            let mut arr = JsonArray::new();
            arr.append_alias(other);
            arr
        }
    }
}

impl JsonObject {
    /// Merge another object into this one, consuming it. Values under
    /// common keys merge recursively.
    pub fn consume(&mut self, other: JsonObject) -> Result<(), DomError> {
        let merged = merge_objects(std::mem::take(self), other, 1)?;
        *self = merged;
        Ok(())
    }
}
