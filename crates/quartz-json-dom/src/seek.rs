//! Path evaluation over the DOM.

use std::collections::HashSet;

use quartz_json_path::{ArrayIndex, JsonPath, PathLeg};

use crate::value::JsonValue;

/// Evaluate `path` against `root`, returning matches in document
/// order.
///
/// With `auto_wrap`, a non-array value matched by an auto-wrap
/// eligible leg stands in for a single-element array. With
/// `only_need_one`, evaluation short-circuits after the first match.
/// Duplicates (possible only through recursive descent) are
/// suppressed by node identity.
pub fn seek<'a>(
    root: &'a JsonValue,
    path: &JsonPath,
    auto_wrap: bool,
    only_need_one: bool,
) -> Vec<&'a JsonValue> {
    let mut hits: Vec<&'a JsonValue> = vec![root];
    let leg_count = path.leg_count();
    for (leg_idx, leg) in path.legs().iter().enumerate() {
        let need_one_here = only_need_one && leg_idx == leg_count - 1;
        let mut candidates = Vec::new();
        let mut duplicates = HashSet::new();
        for &node in &hits {
            find_child_doms(node, leg, auto_wrap, need_one_here, &mut duplicates, &mut candidates);
        }
        hits = candidates;
    }
    hits
}

fn seek_done(result: &[&JsonValue], only_need_one: bool) -> bool {
    only_need_one && !result.is_empty()
}

fn add_if_missing<'a>(
    node: &'a JsonValue,
    duplicates: &mut HashSet<usize>,
    result: &mut Vec<&'a JsonValue>,
) {
    if duplicates.insert(node as *const JsonValue as usize) {
        result.push(node);
    }
}

fn find_child_doms<'a>(
    node: &'a JsonValue,
    leg: &PathLeg,
    auto_wrap: bool,
    only_need_one: bool,
    duplicates: &mut HashSet<usize>,
    result: &mut Vec<&'a JsonValue>,
) {
    if seek_done(result, only_need_one) {
        return;
    }

    // A non-array auto-wraps into a one-element array for eligible legs.
    if auto_wrap && !matches!(node, JsonValue::Array(_)) && leg.is_autowrap() {
        add_if_missing(node, duplicates, result);
        return;
    }

    match leg {
        PathLeg::Member(name) => {
            if let JsonValue::Object(obj) = node {
                if let Some(child) = obj.get(name) {
                    add_if_missing(child, duplicates, result);
                }
            }
        }
        PathLeg::MemberWildcard => {
            if let JsonValue::Object(obj) = node {
                for (_, child) in obj.iter() {
                    add_if_missing(child, duplicates, result);
                    if seek_done(result, only_need_one) {
                        return;
                    }
                }
            }
        }
        PathLeg::Cell(_) | PathLeg::CellWildcard | PathLeg::Range { .. } => {
            if let JsonValue::Array(arr) = node {
                let range = leg.array_range(arr.len());
                for i in range.begin..range.end {
                    if let Some(child) = arr.get(i) {
                        add_if_missing(child, duplicates, result);
                    }
                    if seek_done(result, only_need_one) {
                        return;
                    }
                }
            }
        }
        PathLeg::Ellipsis => {
            // The node itself matches, then every transitive child in
            // document order.
            add_if_missing(node, duplicates, result);
            match node {
                JsonValue::Array(arr) => {
                    for child in arr.iter() {
                        add_if_missing(child, duplicates, result);
                        if seek_done(result, only_need_one) {
                            return;
                        }
                        if child.is_container() {
                            find_child_doms(child, leg, auto_wrap, only_need_one, duplicates, result);
                        }
                    }
                }
                JsonValue::Object(obj) => {
                    for (_, child) in obj.iter() {
                        add_if_missing(child, duplicates, result);
                        if seek_done(result, only_need_one) {
                            return;
                        }
                        if child.is_container() {
                            find_child_doms(child, leg, auto_wrap, only_need_one, duplicates, result);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Produce the canonical path from `root` to `target`, identified by
/// node identity. Returns `None` when `target` is not in the tree.
pub fn path_to(root: &JsonValue, target: &JsonValue) -> Option<JsonPath> {
    let mut legs = Vec::new();
    if locate(root, target, &mut legs) {
        Some(JsonPath::new(legs))
    } else {
        None
    }
}

fn locate(node: &JsonValue, target: &JsonValue, legs: &mut Vec<PathLeg>) -> bool {
    if std::ptr::eq(node, target) {
        return true;
    }
    match node {
        JsonValue::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                legs.push(PathLeg::Cell(ArrayIndex::forward(i as u32)));
                if locate(child, target, legs) {
                    return true;
                }
                legs.pop();
            }
            false
        }
        JsonValue::Object(obj) => {
            for (key, child) in obj.iter() {
                legs.push(PathLeg::Member(key.to_string()));
                if locate(child, target, legs) {
                    return true;
                }
                legs.pop();
            }
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;
    use crate::serializer::serialize_text;

    fn parse(text: &str) -> JsonValue {
        parse_text(text.as_bytes(), false).unwrap()
    }

    fn seek_texts(doc: &str, path: &str, auto_wrap: bool) -> Vec<String> {
        let root = parse(doc);
        let path = JsonPath::parse(path).unwrap();
        seek(&root, &path, auto_wrap, false)
            .into_iter()
            .map(serialize_text)
            .collect()
    }

    #[test]
    fn member_and_cell() {
        assert_eq!(seek_texts(r#"{"a": [1, 2]}"#, "$.a[1]", false), ["2"]);
        assert_eq!(seek_texts(r#"{"a": [1, 2]}"#, "$.a[last]", false), ["2"]);
        assert!(seek_texts(r#"{"a": [1, 2]}"#, "$.b", false).is_empty());
    }

    #[test]
    fn wildcards() {
        assert_eq!(
            seek_texts(r#"{"a": 1, "b": 2}"#, "$.*", false),
            ["1", "2"]
        );
        assert_eq!(
            seek_texts(r#"[10, 20, 30]"#, "$[*]", false),
            ["10", "20", "30"]
        );
        assert_eq!(
            seek_texts(r#"[10, 20, 30, 40]"#, "$[1 to 2]", false),
            ["20", "30"]
        );
    }

    #[test]
    fn ellipsis_document_order_no_duplicates() {
        let hits = seek_texts(r#"{"a":[1,{"a":2}],"b":{"a":3}}"#, "$..a", false);
        assert_eq!(hits, [r#"[1, {"a": 2}]"#, "2", "3"]);
    }

    #[test]
    fn ellipsis_cell_wildcard_suppresses_duplicates() {
        // The ellipsis emits both arrays; the cell wildcard then sees
        // the inner array twice and must emit its element once.
        let hits = seek_texts(r#"[[1]]"#, "$..[*]", false);
        assert_eq!(hits, [r#"[1]"#, "1"]);
    }

    #[test]
    fn auto_wrap_matches_scalar_as_array() {
        assert_eq!(seek_texts(r#"{"a": 5}"#, "$.a[0]", true), ["5"]);
        assert_eq!(seek_texts(r#"{"a": 5}"#, "$.a[*]", true), ["5"]);
        assert!(seek_texts(r#"{"a": 5}"#, "$.a[0]", false).is_empty());
        assert!(seek_texts(r#"{"a": 5}"#, "$.a[1]", true).is_empty());
    }

    #[test]
    fn only_need_one_short_circuits() {
        let root = parse(r#"[1, 2, 3]"#);
        let path = JsonPath::parse("$[*]").unwrap();
        let hits = seek(&root, &path, false, true);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn location_of_nested_node() {
        let root = parse(r#"{"a": [1, {"b c": 2}]}"#);
        let path = JsonPath::parse(r#"$.a[1]."b c""#).unwrap();
        let hits = seek(&root, &path, false, false);
        assert_eq!(hits.len(), 1);
        let loc = path_to(&root, hits[0]).unwrap();
        assert_eq!(loc.to_string(), r#"$.a[1]."b c""#);
    }

    #[test]
    fn location_of_root_is_dollar() {
        let root = parse("1");
        assert_eq!(path_to(&root, &root).unwrap().to_string(), "$");
    }
}
