//! Partial in-place update and remove against the binary form.
//!
//! Both operations either patch a shadow buffer and re-point the
//! wrapper at it, or decline and leave everything untouched; a
//! decline is the signal for the caller to fall back to a full
//! DOM-based rewrite. The original bytes are never modified, so
//! readers holding the old buffer stay consistent until the caller
//! swaps it out.

use quartz_json_binary::{parse_binary, space_needed, BinContainer, BinValue};
use quartz_json_dom::JsonValue;
use quartz_json_path::{JsonPath, PathLeg};

use crate::error::JsonError;
use crate::seek::seek_no_ellipsis;
use crate::wrapper::{JsonWrapper, View};

/// Outcome of [`JsonWrapper::update_in_place`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialUpdateStatus {
    /// False means the operation declined and the caller must do a
    /// full rewrite. True with `replaced_path` false is a successful
    /// no-op.
    pub partially_updated: bool,
    /// True when the document bytes actually changed.
    pub replaced_path: bool,
}

/// Outcome of [`JsonWrapper::remove_in_place`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveStatus {
    pub partially_updated: bool,
    /// True when the path matched and its target was removed.
    pub found_path: bool,
}

const DECLINED: PartialUpdateStatus = PartialUpdateStatus {
    partially_updated: false,
    replaced_path: false,
};

fn no_op(partially_updated: bool) -> PartialUpdateStatus {
    PartialUpdateStatus {
        partially_updated,
        replaced_path: false,
    }
}

/// Where the last path leg landed in the parent container.
enum Target {
    Slot(usize),
    /// The path cannot match; `true` means the operation is a
    /// successful no-op, `false` that it must decline.
    Miss(bool),
}

impl<'a> JsonWrapper<'a> {
    /// Replace the value at `path` inside a binary document without
    /// growing it. With `replace` semantics a missing path is a
    /// no-op; with set semantics it declines so the caller can add
    /// the member or cell through a full rewrite. On success the
    /// wrapper re-points at `result`, which holds the patched
    /// document.
    pub fn update_in_place(
        &mut self,
        path: &JsonPath,
        new_value: &JsonValue,
        replace: bool,
        result: &'a mut Vec<u8>,
    ) -> Result<PartialUpdateStatus, JsonError> {
        // The root is always a full rewrite, and wildcard paths are
        // resolved by the caller against the DOM.
        if path.leg_count() == 0 || path.contains_wildcard_or_ellipsis() {
            return Ok(DECLINED);
        }
        let JsonWrapper::Binary(root) = self else {
            return Ok(DECLINED);
        };

        let last_leg = path.legs().last().expect("path is not empty");
        let parent = match seek_update_parent(*root, path)? {
            ParentHit::Container(parent) => parent,
            ParentHit::Scalar => {
                // No element to replace inside a scalar. Set
                // semantics with a cell leg would auto-wrap it, which
                // needs the full rewrite.
                let autowrap_set = !replace && matches!(last_leg, PathLeg::Cell(_));
                return Ok(no_op(!autowrap_set));
            }
            ParentHit::None => return Ok(no_op(true)),
        };

        let slot = match resolve_target(&parent, last_leg, replace) {
            Target::Slot(slot) => slot,
            Target::Miss(success) => return Ok(no_op(success)),
        };

        let needed = space_needed(new_value, parent.large_format())?;
        let data_offset = if needed > 0 {
            match parent.has_space(slot, needed)? {
                Some(offset) => offset,
                None => return Ok(DECLINED),
            }
        } else {
            0
        };

        // Shadow write: seed the destination with the original bytes,
        // patch, then swap the wrapper onto the new buffer.
        let original = parent.doc();
        result.clear();
        result.extend_from_slice(original);
        parent.update_in_shadow(result, slot, new_value, data_offset)?;

        *self = JsonWrapper::Binary(parse_binary(result)?);
        Ok(PartialUpdateStatus {
            partially_updated: true,
            replaced_path: true,
        })
    }

    /// Remove the value at `path` inside a binary document. Removal
    /// only frees space, so it never declines for size reasons.
    pub fn remove_in_place(
        &mut self,
        path: &JsonPath,
        result: &'a mut Vec<u8>,
    ) -> Result<RemoveStatus, JsonError> {
        let not_found = RemoveStatus {
            partially_updated: true,
            found_path: false,
        };
        if path.leg_count() == 0 || path.contains_wildcard_or_ellipsis() {
            return Ok(RemoveStatus {
                partially_updated: false,
                found_path: false,
            });
        }
        let JsonWrapper::Binary(root) = self else {
            return Ok(RemoveStatus {
                partially_updated: false,
                found_path: false,
            });
        };

        let parent = match seek_update_parent(*root, path)? {
            ParentHit::Container(parent) => parent,
            // Scalars hold nothing removable.
            ParentHit::Scalar | ParentHit::None => return Ok(not_found),
        };
        let last_leg = path.legs().last().expect("path is not empty");
        let slot = match resolve_target(&parent, last_leg, true) {
            Target::Slot(slot) => slot,
            Target::Miss(_) => return Ok(not_found),
        };

        let original = parent.doc();
        result.clear();
        result.extend_from_slice(original);
        parent.remove_in_shadow(result, slot)?;

        *self = JsonWrapper::Binary(parse_binary(result)?);
        Ok(RemoveStatus {
            partially_updated: true,
            found_path: true,
        })
    }
}

/// What the parent seek found.
enum ParentHit<'v> {
    Container(BinContainer<'v>),
    Scalar,
    None,
}

/// Seek the parent of the path's target: all legs but the last, with
/// auto-wrap disabled.
fn seek_update_parent<'v>(
    root: BinValue<'v>,
    path: &JsonPath,
) -> Result<ParentHit<'v>, JsonError> {
    let parent_legs = &path.legs()[..path.leg_count() - 1];
    let mut hits = Vec::new();
    seek_no_ellipsis(View::Binary(root), parent_legs, false, true, &mut hits)?;
    match hits.first() {
        Some(View::Binary(BinValue::Array(c))) | Some(View::Binary(BinValue::Object(c))) => {
            Ok(ParentHit::Container(*c))
        }
        Some(_) => Ok(ParentHit::Scalar),
        None => Ok(ParentHit::None),
    }
}

/// Resolve the last leg against the parent's kind.
fn resolve_target(parent: &BinContainer<'_>, leg: &PathLeg, replace: bool) -> Target {
    if parent.is_object() {
        match leg {
            PathLeg::Member(name) => match parent.lookup_index(name.as_bytes()) {
                Ok(Some(slot)) => Target::Slot(slot),
                // Absent member: a no-op for replace, a full rewrite
                // for set which must add it.
                _ => Target::Miss(replace),
            },
            // A cell leg cannot address an object member; set would
            // auto-wrap, so it falls back to the full rewrite.
            _ => Target::Miss(replace),
        }
    } else {
        match leg {
            PathLeg::Cell(idx) => {
                let resolved = idx.resolve(parent.element_count());
                if resolved.within_bounds() {
                    Target::Slot(resolved.position())
                } else {
                    Target::Miss(replace)
                }
            }
            // A member leg never matches inside an array.
            _ => Target::Miss(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_json_binary::serialize;
    use quartz_json_dom::{parse_text, serialize_text};

    fn bin(text: &str) -> Vec<u8> {
        serialize(&parse_text(text.as_bytes(), false).unwrap()).unwrap()
    }

    fn dom(text: &str) -> JsonValue {
        parse_text(text.as_bytes(), false).unwrap()
    }

    fn text_of(w: &JsonWrapper<'_>) -> String {
        serialize_text(&w.clone_dom().unwrap())
    }

    #[test]
    fn replace_array_cell_in_place() {
        let original = bin(r#"["abcdef", 2]"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$[0]").unwrap();
        let status = w
            .update_in_place(&path, &dom("\"xy\""), true, &mut result)
            .unwrap();
        assert!(status.partially_updated);
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), r#"["xy", 2]"#);
        drop(w);
        assert_eq!(result.len(), original.len());
    }

    #[test]
    fn replace_object_member_in_place() {
        let original = bin(r#"{"a": "hello", "b": 1}"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.a").unwrap();
        let status = w
            .update_in_place(&path, &dom("\"hi\""), true, &mut result)
            .unwrap();
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), r#"{"a": "hi", "b": 1}"#);
    }

    #[test]
    fn update_declines_when_value_grows() {
        let original = bin("[1]");
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$[0]").unwrap();
        let status = w
            .update_in_place(
                &path,
                &dom("\"a-long-string-that-needs-more-bytes\""),
                true,
                &mut result,
            )
            .unwrap();
        assert!(!status.partially_updated);
        assert!(!status.replaced_path);
        // The wrapper still reads the original document.
        assert_eq!(text_of(&w), "[1]");
    }

    #[test]
    fn missing_member_is_noop_for_replace_decline_for_set() {
        let original = bin(r#"{"a": 1}"#);

        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.missing").unwrap();
        let status = w
            .update_in_place(&path, &dom("2"), true, &mut result)
            .unwrap();
        assert!(status.partially_updated);
        assert!(!status.replaced_path);

        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let status = w
            .update_in_place(&path, &dom("2"), false, &mut result)
            .unwrap();
        assert!(!status.partially_updated);
    }

    #[test]
    fn missing_parent_is_noop_for_both() {
        let original = bin(r#"{"a": 1}"#);
        let path = JsonPath::parse("$.b.c").unwrap();
        for replace in [true, false] {
            let mut result = Vec::new();
            let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
            let status = w
                .update_in_place(&path, &dom("2"), replace, &mut result)
                .unwrap();
            assert!(status.partially_updated);
            assert!(!status.replaced_path);
        }
    }

    #[test]
    fn root_path_always_declines() {
        let original = bin("[1]");
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let status = w
            .update_in_place(&JsonPath::root(), &dom("2"), true, &mut result)
            .unwrap();
        assert!(!status.partially_updated);
    }

    #[test]
    fn from_end_index_updates_in_place() {
        let original = bin(r#"[10, 20, 30]"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$[last]").unwrap();
        let status = w
            .update_in_place(&path, &dom("3"), true, &mut result)
            .unwrap();
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), "[10, 20, 3]");
    }

    #[test]
    fn nested_update_targets_inner_container() {
        let original = bin(r#"{"a": {"b": "long-string-here"}}"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.a.b").unwrap();
        let status = w
            .update_in_place(&path, &dom("\"short\""), true, &mut result)
            .unwrap();
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), r#"{"a": {"b": "short"}}"#);
    }

    #[test]
    fn update_preserves_round_trip_against_dom_edit() {
        // Property: a successful in-place update equals the same edit
        // applied through the DOM.
        let original = bin(r#"{"k": [1, 2, 3], "s": "value"}"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.k[1]").unwrap();
        let status = w
            .update_in_place(&path, &dom("9"), true, &mut result)
            .unwrap();
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), r#"{"k": [1, 9, 3], "s": "value"}"#);
        drop(w);
        assert_eq!(result.len(), original.len());
    }

    #[test]
    fn remove_member_and_cell() {
        let original = bin(r#"{"a": 1, "b": [1, 2]}"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.b[0]").unwrap();
        let status = w.remove_in_place(&path, &mut result).unwrap();
        assert!(status.partially_updated);
        assert!(status.found_path);
        assert_eq!(text_of(&w), r#"{"a": 1, "b": [2]}"#);
        drop(w);
        assert_eq!(result.len(), original.len());
    }

    #[test]
    fn remove_missing_path_reports_not_found() {
        let original = bin(r#"{"a": 1}"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$.b").unwrap();
        let status = w.remove_in_place(&path, &mut result).unwrap();
        assert!(status.partially_updated);
        assert!(!status.found_path);
    }

    #[test]
    fn set_into_scalar_slot_within_free_space() {
        // "ab" -> int: the freed string payload is big enough, so the
        // update stays in place even though the kinds differ.
        let original = bin(r#"["ab"]"#);
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let path = JsonPath::parse("$[0]").unwrap();
        let status = w
            .update_in_place(&path, &dom("5"), false, &mut result)
            .unwrap();
        assert!(status.partially_updated);
        assert!(status.replaced_path);
        assert_eq!(text_of(&w), "[5]");
    }
}
