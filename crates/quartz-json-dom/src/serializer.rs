//! DOM to JSON text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::temporal::{format_temporal, TemporalKind};
use crate::value::{FieldType, JsonValue};

/// Serialize a DOM to compact JSON text.
pub fn serialize_text(value: &JsonValue) -> String {
    let mut out = String::new();
    serialize_text_into(value, &mut out);
    out
}

/// Serialize a DOM to compact JSON text, appending to `out`.
pub fn serialize_text_into(value: &JsonValue, out: &mut String) {
    write_value(value, out, None);
}

/// Serialize a DOM to indented JSON text: two-space indent, one
/// member or element per line.
pub fn serialize_pretty(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(value, &mut out, Some(0));
    out
}

/// Format a double so that it reads back as a double: integral values
/// keep one fractional digit.
pub fn format_double(d: f64) -> String {
    if d == d.trunc() && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}

/// Append `s` as a quoted JSON string.
pub fn quote_json_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn newline_indent(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn write_value(value: &JsonValue, out: &mut String, indent: Option<usize>) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Int(i) => out.push_str(&i.to_string()),
        JsonValue::Uint(u) => out.push_str(&u.to_string()),
        JsonValue::Double(d) => out.push_str(&format_double(*d)),
        JsonValue::Decimal(d) => out.push_str(&d.to_string()),
        JsonValue::Str(s) => quote_json_string(s, out),
        JsonValue::Date(p) => {
            quote_json_string(&format_temporal(TemporalKind::Date, *p), out)
        }
        JsonValue::Time(p) => {
            quote_json_string(&format_temporal(TemporalKind::Time, *p), out)
        }
        JsonValue::Datetime(p) => {
            quote_json_string(&format_temporal(TemporalKind::Datetime, *p), out)
        }
        JsonValue::Timestamp(p) => {
            quote_json_string(&format_temporal(TemporalKind::Timestamp, *p), out)
        }
        JsonValue::Opaque(op) => {
            let FieldType(code) = op.field_type;
            let text = format!("base64:type{}:{}", code, BASE64.encode(&op.data));
            quote_json_string(&text, out);
        }
        JsonValue::Array(arr) => {
            out.push('[');
            let inner = indent.map(|l| l + 1);
            for (i, elem) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                    if indent.is_none() {
                        out.push(' ');
                    }
                }
                if let Some(level) = inner {
                    newline_indent(out, level);
                }
                write_value(elem, out, inner);
            }
            if let Some(level) = indent {
                if !arr.is_empty() {
                    newline_indent(out, level);
                }
            }
            out.push(']');
        }
        JsonValue::Object(obj) => {
            out.push('{');
            let inner = indent.map(|l| l + 1);
            for (i, (key, elem)) in obj.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                    if indent.is_none() {
                        out.push(' ');
                    }
                }
                if let Some(level) = inner {
                    newline_indent(out, level);
                }
                quote_json_string(key, out);
                out.push_str(": ");
                write_value(elem, out, inner);
            }
            if let Some(level) = indent {
                if !obj.is_empty() {
                    newline_indent(out, level);
                }
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;
    use crate::value::{JsonArray, JsonObject, OpaqueValue};

    #[test]
    fn compact_output() {
        let v = parse_text(br#"{"b": [1, 2], "a": true}"#, false).unwrap();
        // Members come out in comparator order.
        assert_eq!(serialize_text(&v), r#"{"a": true, "b": [1, 2]}"#);
    }

    #[test]
    fn doubles_read_back_as_doubles() {
        assert_eq!(format_double(1.0), "1.0");
        assert_eq!(format_double(-0.0), "-0.0");
        assert_eq!(format_double(1.5), "1.5");
        let v = parse_text(b"[1.0]", false).unwrap();
        let text = serialize_text(&v);
        let back = parse_text(text.as_bytes(), false).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn string_escaping() {
        let mut out = String::new();
        quote_json_string("a\"b\\c\n\u{0001}", &mut out);
        assert_eq!(out, "\"a\\\"b\\\\c\\n\\u0001\"");
    }

    #[test]
    fn round_trip_equivalence() {
        for text in [
            "null",
            "[]",
            "{}",
            r#"{"a": 1, "b": {"c": [true, false, null]}, "d": "x"}"#,
            r#"[-1, 18446744073709551615, 2.5, "s"]"#,
        ] {
            let v = parse_text(text.as_bytes(), false).unwrap();
            let back = parse_text(serialize_text(&v).as_bytes(), false).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn opaque_renders_as_base64() {
        let v = JsonValue::Opaque(OpaqueValue {
            field_type: FieldType::BLOB,
            data: vec![0xca, 0xfe],
        });
        assert_eq!(serialize_text(&v), r#""base64:type252:yv4=""#);
    }

    #[test]
    fn pretty_layout() {
        let mut obj = JsonObject::new();
        let mut arr = JsonArray::new();
        arr.append_alias(JsonValue::Int(1));
        obj.add_alias("a", JsonValue::Array(arr));
        let text = serialize_pretty(&JsonValue::Object(obj));
        assert_eq!(text, "{\n  \"a\": [\n    1\n  ]\n}");
    }
}
