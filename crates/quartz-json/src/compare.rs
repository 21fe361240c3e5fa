//! Total ordering over JSON values.
//!
//! Cross-kind order follows the fixed precedence chain: null, then
//! all numeric kinds as one class, strings, objects, arrays,
//! booleans, dates, times, datetimes together with timestamps, and
//! opaques last. Within the numeric class, values compare by exact
//! numeric value: a double tied with an integer when compared as
//! doubles is re-broken by converting the integer to a decimal, so
//! integers outside double's exact range still order correctly.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;

use quartz_json_dom::{JsonType, MAX_DEPTH};

use crate::error::JsonError;
use crate::wrapper::{JsonWrapper, View};

/// Rank of a kind in the cross-kind precedence chain. Kinds sharing a
/// rank compare by value.
fn precedence(t: JsonType) -> u8 {
    match t {
        JsonType::Null => 0,
        JsonType::Decimal | JsonType::Int | JsonType::Uint | JsonType::Double => 1,
        JsonType::String => 2,
        JsonType::Object => 3,
        JsonType::Array => 4,
        JsonType::Boolean => 5,
        JsonType::Date => 6,
        JsonType::Time => 7,
        JsonType::Datetime | JsonType::Timestamp => 8,
        JsonType::Opaque => 9,
        JsonType::Error => 10,
    }
}

impl JsonWrapper<'_> {
    /// Compare two values under the total order.
    pub fn compare(&self, other: &JsonWrapper<'_>) -> Result<Ordering, JsonError> {
        compare_views(self.view(), other.view(), 1)
    }
}

pub(crate) fn compare_views(
    a: View<'_>,
    b: View<'_>,
    depth: usize,
) -> Result<Ordering, JsonError> {
    if depth > MAX_DEPTH {
        return Err(JsonError::DepthExceeded);
    }

    let ta = a.json_type();
    let tb = b.json_type();
    let rank = precedence(ta).cmp(&precedence(tb));
    if rank != Ordering::Equal {
        return Ok(rank);
    }

    match ta {
        JsonType::Null => Ok(Ordering::Equal),
        JsonType::Boolean => Ok(a.as_bool().cmp(&b.as_bool())),
        JsonType::String => Ok(a.data().cmp(&b.data())),
        JsonType::Opaque => {
            let ft = a.field_type().cmp(&b.field_type());
            if ft != Ordering::Equal {
                return Ok(ft);
            }
            Ok(a.data().cmp(&b.data()))
        }
        JsonType::Date | JsonType::Time | JsonType::Datetime | JsonType::Timestamp => {
            let pa = a.packed_temporal().map(|(_, p)| p);
            let pb = b.packed_temporal().map(|(_, p)| p);
            Ok(pa.cmp(&pb))
        }
        JsonType::Int | JsonType::Uint | JsonType::Double | JsonType::Decimal => {
            Ok(compare_numbers(a, b))
        }
        JsonType::Array => {
            let len_a = a.length();
            let len_b = b.length();
            for i in 0..len_a.min(len_b) {
                let ea = a.element(i)?.expect("index within length");
                let eb = b.element(i)?.expect("index within length");
                let cmp = compare_views(ea, eb, depth + 1)?;
                if cmp != Ordering::Equal {
                    return Ok(cmp);
                }
            }
            Ok(len_a.cmp(&len_b))
        }
        JsonType::Object => {
            let cmp = a.length().cmp(&b.length());
            if cmp != Ordering::Equal {
                return Ok(cmp);
            }
            let members_a = a.members()?;
            let members_b = b.members()?;
            for ((ka, va), (kb, vb)) in members_a.into_iter().zip(members_b) {
                let cmp = ka.cmp(&kb);
                if cmp != Ordering::Equal {
                    return Ok(cmp);
                }
                let cmp = compare_views(va, vb, depth + 1)?;
                if cmp != Ordering::Equal {
                    return Ok(cmp);
                }
            }
            Ok(Ordering::Equal)
        }
        JsonType::Error => Ok(Ordering::Greater),
    }
}

/// Numeric comparison across the four numeric kinds.
fn compare_numbers(a: View<'_>, b: View<'_>) -> Ordering {
    match (a.json_type(), b.json_type()) {
        (JsonType::Int, JsonType::Int) => a.as_int().cmp(&b.as_int()),
        (JsonType::Uint, JsonType::Uint) => a.as_uint().cmp(&b.as_uint()),
        (JsonType::Double, JsonType::Double) => {
            total_cmp_finite(a.as_double().unwrap(), b.as_double().unwrap())
        }
        (JsonType::Int, JsonType::Uint) => cmp_int_uint(a.as_int().unwrap(), b.as_uint().unwrap()),
        (JsonType::Uint, JsonType::Int) => {
            cmp_int_uint(b.as_int().unwrap(), a.as_uint().unwrap()).reverse()
        }
        (JsonType::Double, JsonType::Int) => {
            cmp_double_decimal_exact(a.as_double().unwrap(), BigDecimal::from(b.as_int().unwrap()))
        }
        (JsonType::Int, JsonType::Double) => {
            cmp_double_decimal_exact(b.as_double().unwrap(), BigDecimal::from(a.as_int().unwrap()))
                .reverse()
        }
        (JsonType::Double, JsonType::Uint) => {
            cmp_double_decimal_exact(a.as_double().unwrap(), BigDecimal::from(b.as_uint().unwrap()))
        }
        (JsonType::Uint, JsonType::Double) => {
            cmp_double_decimal_exact(b.as_double().unwrap(), BigDecimal::from(a.as_uint().unwrap()))
                .reverse()
        }
        (JsonType::Decimal, _) => {
            let da = a.decimal().unwrap_or_default();
            cmp_decimal_other(&da, b)
        }
        (_, JsonType::Decimal) => {
            let db = b.decimal().unwrap_or_default();
            cmp_decimal_other(&db, a).reverse()
        }
        _ => unreachable!("non-numeric kind in numeric comparison"),
    }
}

fn total_cmp_finite(a: f64, b: f64) -> Ordering {
    // Finite by construction; -0.0 and 0.0 compare equal.
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn cmp_int_uint(a: i64, b: u64) -> Ordering {
    if a < 0 {
        Ordering::Less
    } else {
        (a as u64).cmp(&b)
    }
}

/// Two-step double/integer comparison: first as doubles, then an
/// exact decimal tie-break for integers the double conversion may
/// have rounded.
fn cmp_double_decimal_exact(a: f64, b_exact: BigDecimal) -> Ordering {
    let b_double = bigdecimal::ToPrimitive::to_f64(&b_exact).unwrap_or(f64::MAX);
    if a < b_double {
        return Ordering::Less;
    }
    if a > b_double {
        return Ordering::Greater;
    }
    match BigDecimal::try_from(a) {
        Ok(a_exact) => a_exact.cmp(&b_exact),
        Err(_) => Ordering::Equal,
    }
}

fn cmp_decimal_other(a: &BigDecimal, b: View<'_>) -> Ordering {
    match b.json_type() {
        JsonType::Decimal => a.cmp(&b.decimal().unwrap_or_default()),
        JsonType::Int => a.cmp(&BigDecimal::from(b.as_int().unwrap())),
        JsonType::Uint => a.cmp(&BigDecimal::from(b.as_uint().unwrap())),
        JsonType::Double => match BigDecimal::try_from(b.as_double().unwrap()) {
            Ok(bd) => a.cmp(&bd),
            Err(_) => Ordering::Less,
        },
        _ => unreachable!("non-numeric kind in numeric comparison"),
    }
}
