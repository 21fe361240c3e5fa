//! Coercion of JSON values to scalar SQL types.
//!
//! Coercions never fail: a value that does not fit produces a
//! best-effort result and a warning on the session. Two diagnostics
//! are distinguished throughout: numerically out of range versus not
//! a valid value for the cast at all.

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};

use quartz_json_dom::{JsonType, PackedTemporal, TemporalKind};

use crate::session::{Session, Warning};
use crate::wrapper::JsonWrapper;

/// How a string-to-number parse went.
enum ParseOutcome {
    Exact,
    OutOfRange,
    Invalid,
}

impl JsonWrapper<'_> {
    /// Coerce to a signed 64-bit integer. `context` names the column
    /// or expression for warnings.
    pub fn coerce_int(&self, session: &mut Session, context: &str) -> i64 {
        match self.json_type() {
            JsonType::Int => self.get_int().unwrap_or(0),
            JsonType::Uint => self.get_uint().unwrap_or(0) as i64,
            JsonType::Boolean => {
                if self.get_boolean() == Some(true) {
                    1
                } else {
                    0
                }
            }
            JsonType::String => {
                let data = self.get_data().unwrap_or_default();
                let text = String::from_utf8_lossy(&data);
                let (value, outcome) = parse_int_text(text.trim());
                match outcome {
                    ParseOutcome::Exact => {}
                    ParseOutcome::OutOfRange => session.push_warning(Warning::OutOfRange {
                        target: "INTEGER",
                        context: context.to_string(),
                    }),
                    ParseOutcome::Invalid => session.push_warning(Warning::InvalidCast {
                        target: "INTEGER",
                        context: context.to_string(),
                    }),
                }
                value
            }
            JsonType::Decimal => {
                let d = self.get_decimal().unwrap_or_default();
                match d
                    .with_scale_round(0, bigdecimal::rounding::RoundingMode::HalfUp)
                    .to_i64()
                {
                    Some(i) => i,
                    None => {
                        session.push_warning(Warning::OutOfRange {
                            target: "INTEGER",
                            context: context.to_string(),
                        });
                        if d < BigDecimal::default() {
                            i64::MIN
                        } else {
                            i64::MAX
                        }
                    }
                }
            }
            JsonType::Double => {
                let d = self.get_double().unwrap_or(0.0);
                if d <= i64::MIN as f64 {
                    session.push_warning(Warning::OutOfRange {
                        target: "INTEGER",
                        context: context.to_string(),
                    });
                    i64::MIN
                } else if d >= i64::MAX as f64 {
                    session.push_warning(Warning::OutOfRange {
                        target: "INTEGER",
                        context: context.to_string(),
                    });
                    i64::MAX
                } else {
                    d.round_ties_even() as i64
                }
            }
            _ => {
                session.push_warning(Warning::InvalidCast {
                    target: "INTEGER",
                    context: context.to_string(),
                });
                0
            }
        }
    }

    /// Coerce to a double.
    pub fn coerce_real(&self, session: &mut Session, context: &str) -> f64 {
        match self.json_type() {
            JsonType::Double => self.get_double().unwrap_or(0.0),
            JsonType::Int => self.get_int().unwrap_or(0) as f64,
            JsonType::Uint => self.get_uint().unwrap_or(0) as f64,
            JsonType::Boolean => {
                if self.get_boolean() == Some(true) {
                    1.0
                } else {
                    0.0
                }
            }
            JsonType::Decimal => self
                .get_decimal()
                .unwrap_or_default()
                .to_f64()
                .unwrap_or(0.0),
            JsonType::String => {
                let data = self.get_data().unwrap_or_default();
                let text = String::from_utf8_lossy(&data);
                let trimmed = text.trim();
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => v,
                    Ok(v) => {
                        // Parsed but overflowed to infinity.
                        session.push_warning(Warning::OutOfRange {
                            target: "DOUBLE",
                            context: context.to_string(),
                        });
                        if v.is_sign_negative() {
                            f64::MIN
                        } else {
                            f64::MAX
                        }
                    }
                    Err(_) => {
                        session.push_warning(Warning::InvalidCast {
                            target: "DOUBLE",
                            context: context.to_string(),
                        });
                        numeric_prefix(trimmed).parse().unwrap_or(0.0)
                    }
                }
            }
            _ => {
                session.push_warning(Warning::InvalidCast {
                    target: "DOUBLE",
                    context: context.to_string(),
                });
                0.0
            }
        }
    }

    /// Coerce to a decimal.
    pub fn coerce_decimal(&self, session: &mut Session, context: &str) -> BigDecimal {
        match self.json_type() {
            JsonType::Decimal => self.get_decimal().unwrap_or_default(),
            JsonType::Int => BigDecimal::from(self.get_int().unwrap_or(0)),
            JsonType::Uint => BigDecimal::from(self.get_uint().unwrap_or(0)),
            JsonType::Boolean => BigDecimal::from(u8::from(self.get_boolean() == Some(true))),
            JsonType::Double => BigDecimal::try_from(self.get_double().unwrap_or(0.0))
                .unwrap_or_default(),
            JsonType::String => {
                let data = self.get_data().unwrap_or_default();
                let text = String::from_utf8_lossy(&data);
                let trimmed = text.trim();
                match BigDecimal::from_str(trimmed) {
                    Ok(d) => d,
                    Err(_) => {
                        session.push_warning(Warning::InvalidCast {
                            target: "DECIMAL",
                            context: context.to_string(),
                        });
                        BigDecimal::from_str(&numeric_prefix(trimmed)).unwrap_or_default()
                    }
                }
            }
            _ => {
                session.push_warning(Warning::InvalidCast {
                    target: "DECIMAL",
                    context: context.to_string(),
                });
                BigDecimal::default()
            }
        }
    }

    /// Coerce to a temporal value. Only temporal kinds qualify;
    /// anything else warns and yields nothing.
    pub fn coerce_time(
        &self,
        session: &mut Session,
        context: &str,
    ) -> Option<(TemporalKind, PackedTemporal)> {
        match self.json_type() {
            JsonType::Date | JsonType::Time | JsonType::Datetime | JsonType::Timestamp => {
                let packed = self.get_datetime_packed()?;
                let kind = match self.json_type() {
                    JsonType::Date => TemporalKind::Date,
                    JsonType::Time => TemporalKind::Time,
                    JsonType::Datetime => TemporalKind::Datetime,
                    _ => TemporalKind::Timestamp,
                };
                Some((kind, packed))
            }
            _ => {
                session.push_warning(Warning::InvalidCast {
                    target: "DATE/TIME/DATETIME/TIMESTAMP",
                    context: context.to_string(),
                });
                None
            }
        }
    }

    /// Coerce to a date-bearing temporal: a pure time of day is
    /// promoted to a datetime on the session's current date.
    pub fn coerce_date(
        &self,
        session: &mut Session,
        context: &str,
    ) -> Option<(TemporalKind, PackedTemporal)> {
        let (kind, packed) = self.coerce_time(session, context)?;
        if kind == TemporalKind::Time {
            Some((TemporalKind::Datetime, session.time_to_datetime(packed)))
        } else {
            Some((kind, packed))
        }
    }
}

/// Parse a decimal integer prefix with clamping, reporting how much
/// of the input was consumed and whether the value fit.
fn parse_int_text(text: &str) -> (i64, ParseOutcome) {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let digits_start = pos;
    let mut value: i64 = 0;
    let mut overflow = false;
    while let Some(&c) = bytes.get(pos) {
        if !c.is_ascii_digit() {
            break;
        }
        let digit = (c - b'0') as i64;
        value = match value.checked_mul(10).and_then(|v| {
            if negative {
                v.checked_sub(digit)
            } else {
                v.checked_add(digit)
            }
        }) {
            Some(v) => v,
            None => {
                overflow = true;
                break;
            }
        };
        pos += 1;
    }
    if overflow {
        return (if negative { i64::MIN } else { i64::MAX }, ParseOutcome::OutOfRange);
    }
    if pos == digits_start || pos != bytes.len() {
        return (value, ParseOutcome::Invalid);
    }
    (value, ParseOutcome::Exact)
}

/// Longest prefix that still parses as a number, for the best-effort
/// value behind an invalid-cast warning.
fn numeric_prefix(text: &str) -> String {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in text.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '.' if !seen_dot => seen_dot = true,
            '0'..='9' => seen_digit = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if seen_digit {
        text[..end].to_string()
    } else {
        "0".to_string()
    }
}
