//! Sort-key generation: a byte string whose memcmp order reproduces
//! the total order of [`compare`](crate::wrapper::JsonWrapper::compare)
//! for scalars.
//!
//! Every numeric kind shares one encoding: a sign tag, a two-byte
//! big-endian decimal exponent, the significant digits in ASCII, and
//! zero padding out to a fixed width so trailing zeros cannot affect
//! the order. Negative numbers invert the exponent and digits so
//! larger negatives sort first. Objects and arrays encode only their
//! length; the session gets a warning because their sort order is
//! intentionally weaker than their comparison order.

use quartz_json_dom::{JsonType, PACKED_SIZE};

use crate::error::JsonError;
use crate::session::{Session, Warning};
use crate::wrapper::JsonWrapper;

// Kind tags. Lower tags sort first, matching the precedence chain.
pub(crate) const KEY_NULL: u8 = 0x00;
pub(crate) const KEY_NUMBER_NEG: u8 = 0x01;
pub(crate) const KEY_NUMBER_ZERO: u8 = 0x02;
pub(crate) const KEY_NUMBER_POS: u8 = 0x03;
pub(crate) const KEY_STRING: u8 = 0x04;
pub(crate) const KEY_OBJECT: u8 = 0x05;
pub(crate) const KEY_ARRAY: u8 = 0x06;
pub(crate) const KEY_FALSE: u8 = 0x07;
pub(crate) const KEY_TRUE: u8 = 0x08;
pub(crate) const KEY_DATE: u8 = 0x09;
pub(crate) const KEY_TIME: u8 = 0x0A;
pub(crate) const KEY_DATETIME: u8 = 0x0B;
pub(crate) const KEY_OPAQUE: u8 = 0x0C;

/// Maximum decimal precision of the host's decimal type.
const DECIMAL_MAX_PRECISION: usize = 81;
/// Bytes of the trailing length field on truncated strings.
const VARLEN_PREFIX: usize = 4;
/// Fixed width numeric keys are padded to, covering the maximum
/// precision plus the tag and exponent prefix.
pub const MAX_NUMBER_SORT_PAD: usize = DECIMAL_MAX_PRECISION + VARLEN_PREFIX + 3;

/// Fixed-size key buffer. Writes past the end are dropped, matching
/// the truncating contract of the host's key slots.
struct SortKey<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SortKey<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn append(&mut self, byte: u8) {
        if self.pos < self.buf.len() {
            self.buf[self.pos] = byte;
            self.pos += 1;
        }
    }

    /// Pad with `pad` up to absolute position `target`.
    fn pad_till(&mut self, pad: u8, target: usize) {
        let until = target.min(self.buf.len());
        while self.pos < until {
            self.buf[self.pos] = pad;
            self.pos += 1;
        }
    }

    /// Append a big-endian integer so memcmp sorts it numerically;
    /// signed values get their sign bit flipped.
    fn append_int_be(&mut self, bytes_be: &[u8], signed: bool) {
        for (i, &b) in bytes_be.iter().enumerate() {
            let b = if signed && i == 0 { b ^ 0x80 } else { b };
            self.append(b);
        }
    }

    /// Append string bytes; when they do not fit, reserve a trailing
    /// big-endian length so equal prefixes order by length.
    fn append_str_and_len(&mut self, data: &[u8]) {
        if data.len() <= self.remaining() {
            for &b in data {
                self.append(b);
            }
            return;
        }
        let reserve = VARLEN_PREFIX.min(self.remaining());
        let space_for_str = self.remaining() - reserve;
        for &b in &data[..space_for_str] {
            self.append(b);
        }
        self.append_int_be(&(data.len() as u32).to_be_bytes()[..reserve.min(4)], false);
    }
}

impl JsonWrapper<'_> {
    /// Write this value's sort key into `out`. Returns the number of
    /// bytes written.
    pub fn make_sort_key(&self, session: &mut Session, out: &mut [u8]) -> Result<usize, JsonError> {
        let mut key = SortKey::new(out);
        match self.json_type() {
            JsonType::Null => key.append(KEY_NULL),
            JsonType::Int => {
                let i = self.get_int().unwrap_or(0);
                make_numeric_sort_key(&i.to_string(), i < 0, &mut key);
            }
            JsonType::Uint => {
                let u = self.get_uint().unwrap_or(0);
                make_numeric_sort_key(&u.to_string(), false, &mut key);
            }
            JsonType::Double => {
                let d = self.get_double().unwrap_or(0.0);
                make_numeric_sort_key(&double_key_text(d), d < 0.0, &mut key);
            }
            JsonType::Decimal => {
                let d = self.get_decimal().unwrap_or_default();
                let negative = d < bigdecimal::BigDecimal::default();
                make_numeric_sort_key(&d.to_string(), negative, &mut key);
            }
            JsonType::String => {
                key.append(KEY_STRING);
                key.append_str_and_len(&self.get_data().unwrap_or_default());
            }
            JsonType::Object | JsonType::Array => {
                // Containers sort by length only; deep comparison is
                // not reflected in the key.
                key.append(if self.json_type() == JsonType::Object {
                    KEY_OBJECT
                } else {
                    KEY_ARRAY
                });
                key.append_int_be(&(self.length() as u32).to_be_bytes(), false);
                session.push_warning(Warning::SortingNonScalar);
            }
            JsonType::Boolean => {
                key.append(if self.get_boolean() == Some(true) {
                    KEY_TRUE
                } else {
                    KEY_FALSE
                });
            }
            JsonType::Date | JsonType::Time | JsonType::Datetime | JsonType::Timestamp => {
                key.append(match self.json_type() {
                    JsonType::Date => KEY_DATE,
                    JsonType::Time => KEY_TIME,
                    _ => KEY_DATETIME,
                });
                let packed = self.get_datetime_packed().unwrap_or_default();
                debug_assert_eq!(packed.to_le_bytes().len(), PACKED_SIZE);
                key.append_int_be(&packed.raw().to_be_bytes(), true);
            }
            JsonType::Opaque => {
                key.append(KEY_OPAQUE);
                key.append(self.field_type().map(|ft| ft.0).unwrap_or(0));
                key.append_str_and_len(&self.get_data().unwrap_or_default());
            }
            JsonType::Error => {}
        }
        Ok(key.pos)
    }
}

/// Decimal text for a double, bounded to its significant digits:
/// extreme magnitudes use exponent notation so the digit count stays
/// within the numeric pad width.
fn double_key_text(d: f64) -> String {
    let a = d.abs();
    if d != 0.0 && (a < 1e-4 || a >= 1e15) {
        format!("{d:e}")
    } else {
        format!("{d}")
    }
}

/// Build the shared numeric key from a number's decimal text, which
/// may be plain (`-12.34`) or exponent form (`1.234e2`).
fn make_numeric_sort_key(text: &str, negative: bool, key: &mut SortKey<'_>) {
    let bytes = text.as_bytes();
    let digits_end = bytes
        .iter()
        .position(|&c| c == b'e' || c == b'E')
        .unwrap_or(bytes.len());
    let first_significant = bytes[..digits_end]
        .iter()
        .position(|c| (b'1'..=b'9').contains(c));

    let Some(first_significant) = first_significant else {
        // No significant digits anywhere: the number is zero.
        key.append(KEY_NUMBER_ZERO);
        return;
    };

    let mut exp: i64 = if digits_end < bytes.len() {
        // Exponent form normalizes to one digit before the point, so
        // the printed exponent is the decimal exponent.
        text[digits_end + 1..].parse().unwrap_or(0)
    } else {
        match bytes[..digits_end].iter().position(|&c| c == b'.') {
            None => (digits_end - first_significant - 1) as i64,
            Some(dot) if first_significant < dot => (dot - first_significant - 1) as i64,
            Some(dot) => dot as i64 - first_significant as i64,
        }
    };

    if negative {
        key.append(KEY_NUMBER_NEG);
        exp = -exp;
    } else {
        key.append(KEY_NUMBER_POS);
    }

    key.append_int_be(&(exp as i16).to_be_bytes(), true);

    for &c in &bytes[first_significant..digits_end] {
        if c.is_ascii_digit() {
            key.append(if negative { b'9' - c + b'0' } else { c });
        }
    }
    key.pad_till(if negative { b'9' } else { b'0' }, MAX_NUMBER_SORT_PAD);
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_json_dom::parse_text;

    fn sort_key(text: &str) -> Vec<u8> {
        let w = JsonWrapper::from_dom(parse_text(text.as_bytes(), false).unwrap());
        let mut session = Session::new();
        let mut buf = [0u8; 256];
        let n = w.make_sort_key(&mut session, &mut buf).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn numeric_keys_order_by_memcmp() {
        let values = ["-1000", "-1", "-0.5", "0", "0.5", "1", "2", "10", "1000"];
        let keys: Vec<_> = values.iter().map(|v| sort_key(v)).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "keys out of order");
        }
    }

    #[test]
    fn equal_numbers_produce_equal_keys() {
        assert_eq!(sort_key("1"), sort_key("1.0"));
        assert_eq!(sort_key("100"), sort_key("1e2"));
        assert_eq!(sort_key("0"), sort_key("0.0"));
        assert_eq!(sort_key("0"), sort_key("-0.0"));
        assert_eq!(sort_key("0.5"), sort_key("5e-1"));
    }

    #[test]
    fn numeric_keys_have_fixed_width() {
        assert_eq!(sort_key("1").len(), MAX_NUMBER_SORT_PAD);
        assert_eq!(sort_key("-123.456").len(), MAX_NUMBER_SORT_PAD);
        assert_eq!(sort_key("0").len(), 1);
    }

    #[test]
    fn kind_tags_order_keys_across_kinds() {
        // null < number < string < object < array < false < true
        let keys = [
            sort_key("null"),
            sort_key("-1"),
            sort_key("\"a\""),
            sort_key("{}"),
            sort_key("[]"),
            sort_key("false"),
            sort_key("true"),
        ];
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn string_keys_order_by_bytes() {
        assert!(sort_key("\"ab\"") < sort_key("\"ac\""));
        assert!(sort_key("\"ab\"") < sort_key("\"abc\""));
    }

    #[test]
    fn container_key_is_length_only_with_warning() {
        let w = JsonWrapper::from_dom(parse_text(b"[1, 2, 3]", false).unwrap());
        let mut session = Session::new();
        let mut buf = [0u8; 16];
        let n = w.make_sort_key(&mut session, &mut buf).unwrap();
        assert_eq!(&buf[..n], &[KEY_ARRAY, 0, 0, 0, 3]);
        assert!(matches!(session.warnings(), [Warning::SortingNonScalar]));
    }

    #[test]
    fn truncated_string_key_carries_length_suffix() {
        let long = format!("\"{}\"", "z".repeat(300));
        let w = JsonWrapper::from_dom(parse_text(long.as_bytes(), false).unwrap());
        let mut session = Session::new();
        let mut buf = [0u8; 32];
        let n = w.make_sort_key(&mut session, &mut buf).unwrap();
        assert_eq!(n, 32);
        // Tag, 27 string bytes, then the 4-byte big-endian length.
        assert_eq!(buf[0], KEY_STRING);
        assert_eq!(&buf[28..32], &300u32.to_be_bytes());
    }

    #[test]
    fn extreme_doubles_fit_the_pad() {
        for v in ["1e300", "-1e300", "1e-300", "2.5e-8"] {
            let k = sort_key(v);
            assert_eq!(k.len(), MAX_NUMBER_SORT_PAD, "bad width for {v}");
        }
        assert!(sort_key("1e-300") < sort_key("1e300"));
        assert!(sort_key("-1e300") < sort_key("-1e-300"));
        assert!(sort_key("-1e300") < sort_key("0"));
    }
}
