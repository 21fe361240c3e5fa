//! The dual-representation wrapper.

use std::borrow::Cow;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bigdecimal::BigDecimal;

use quartz_json_binary::{parse_binary, serialize, to_dom, BinValue};
use quartz_json_dom::{
    format_double, format_temporal, quote_json_string, FieldType, JsonType, JsonValue,
    PackedTemporal, TemporalKind, PACKED_SIZE,
};

use crate::error::JsonError;
use crate::session::{Session, Warning};

/// A JSON value in either representation.
///
/// `Dom` owns its tree; `DomRef` aliases a node inside a surrounding
/// document and is what seek hands back for DOM hits; `Binary`
/// borrows from column storage. Cloning materializes an owned DOM
/// from an aliased one and shallow-copies a binary view.
#[derive(Debug)]
pub enum JsonWrapper<'a> {
    Dom(Box<JsonValue>),
    DomRef(&'a JsonValue),
    Binary(BinValue<'a>),
}

/// A borrowed view of a wrapper's value: what the internal algorithms
/// (seek, compare, keys, coercion) recurse over. Cheap to copy.
#[derive(Debug, Clone, Copy)]
pub(crate) enum View<'v> {
    Dom(&'v JsonValue),
    Binary(BinValue<'v>),
}

impl Clone for JsonWrapper<'_> {
    fn clone(&self) -> Self {
        match self {
            JsonWrapper::Dom(v) => JsonWrapper::Dom(v.clone()),
            JsonWrapper::DomRef(r) => JsonWrapper::Dom(Box::new((*r).clone())),
            JsonWrapper::Binary(b) => JsonWrapper::Binary(*b),
        }
    }
}

impl<'a> JsonWrapper<'a> {
    /// Wrap an owned DOM.
    pub fn from_dom(value: JsonValue) -> JsonWrapper<'static> {
        JsonWrapper::Dom(Box::new(value))
    }

    /// Wrap a DOM node owned by a surrounding document.
    pub fn from_dom_ref(value: &'a JsonValue) -> Self {
        JsonWrapper::DomRef(value)
    }

    /// Wrap a parsed binary value.
    pub fn from_binary(value: BinValue<'a>) -> Self {
        JsonWrapper::Binary(value)
    }

    /// Parse a binary document and wrap its root.
    pub fn parse_binary_doc(doc: &'a [u8]) -> Result<Self, JsonError> {
        Ok(JsonWrapper::Binary(parse_binary(doc)?))
    }

    pub(crate) fn view(&self) -> View<'_> {
        match self {
            JsonWrapper::Dom(v) => View::Dom(v),
            JsonWrapper::DomRef(r) => View::Dom(r),
            JsonWrapper::Binary(b) => View::Binary(*b),
        }
    }

    pub(crate) fn from_view(view: View<'a>) -> Self {
        match view {
            View::Dom(r) => JsonWrapper::DomRef(r),
            View::Binary(b) => JsonWrapper::Binary(b),
        }
    }

    /// The logical kind. Opaque decimals and temporals in the binary
    /// form surface as their logical kinds here.
    pub fn json_type(&self) -> JsonType {
        self.view().json_type()
    }

    /// Element count for containers, 1 for scalars.
    pub fn length(&self) -> usize {
        self.view().length()
    }

    /// The i-th array element.
    pub fn element(&self, index: usize) -> Result<Option<JsonWrapper<'_>>, JsonError> {
        Ok(self.view().element(index)?.map(JsonWrapper::from_view))
    }

    /// Object member by key.
    pub fn lookup(&self, key: &str) -> Result<Option<JsonWrapper<'_>>, JsonError> {
        Ok(self.view().lookup(key)?.map(JsonWrapper::from_view))
    }

    /// Object members in comparator order.
    pub fn members(&self) -> Result<Vec<(String, JsonWrapper<'_>)>, JsonError> {
        let mut out = Vec::new();
        for (key, child) in self.view().members()? {
            out.push((
                String::from_utf8_lossy(&key).into_owned(),
                JsonWrapper::from_view(child),
            ));
        }
        Ok(out)
    }

    /// Materialize the DOM if this wrapper holds a binary value,
    /// caching it, and return it.
    pub fn to_dom(&mut self) -> Result<&JsonValue, JsonError> {
        if let JsonWrapper::Binary(b) = self {
            let dom = to_dom(b)?;
            *self = JsonWrapper::Dom(Box::new(dom));
        }
        match self {
            JsonWrapper::Dom(v) => Ok(v),
            JsonWrapper::DomRef(r) => Ok(r),
            JsonWrapper::Binary(_) => unreachable!(),
        }
    }

    /// A deep copy of the value as a DOM.
    pub fn clone_dom(&self) -> Result<JsonValue, JsonError> {
        match self {
            JsonWrapper::Dom(v) => Ok((**v).clone()),
            JsonWrapper::DomRef(r) => Ok((*r).clone()),
            JsonWrapper::Binary(b) => Ok(to_dom(b)?),
        }
    }

    /// Serialize into the binary format. DOM values serialize fresh;
    /// binary values copy their raw bytes.
    pub fn to_binary(&self, out: &mut Vec<u8>) -> Result<(), JsonError> {
        match self {
            JsonWrapper::Dom(v) => out.extend_from_slice(&serialize(v)?),
            JsonWrapper::DomRef(r) => out.extend_from_slice(&serialize(r)?),
            JsonWrapper::Binary(b) => b.raw_binary(out),
        }
        Ok(())
    }

    /// Render as JSON text into a host result buffer. Output past the
    /// session's packet limit is truncated with a warning.
    pub fn to_text(&self, session: &mut Session, out: &mut String) -> Result<(), JsonError> {
        write_view_text(self.view(), out)?;
        enforce_packet_limit(session, out);
        Ok(())
    }

    /// Render as indented JSON text, under the same packet limit.
    pub fn to_pretty_text(&self, session: &mut Session, out: &mut String) -> Result<(), JsonError> {
        let dom = self.clone_dom()?;
        out.push_str(&quartz_json_dom::serialize_pretty(&dom));
        enforce_packet_limit(session, out);
        Ok(())
    }

    /// Nesting depth of the document.
    pub fn depth(&self) -> Result<usize, JsonError> {
        match self {
            JsonWrapper::Dom(v) => Ok(v.depth()),
            JsonWrapper::DomRef(r) => Ok(r.depth()),
            JsonWrapper::Binary(b) => Ok(to_dom(b)?.depth()),
        }
    }

    pub fn get_int(&self) -> Option<i64> {
        self.view().as_int()
    }

    pub fn get_uint(&self) -> Option<u64> {
        self.view().as_uint()
    }

    pub fn get_double(&self) -> Option<f64> {
        self.view().as_double()
    }

    pub fn get_boolean(&self) -> Option<bool> {
        self.view().as_bool()
    }

    pub fn get_decimal(&self) -> Option<BigDecimal> {
        self.view().decimal()
    }

    /// Raw bytes of a string or opaque value.
    pub fn get_data(&self) -> Option<Cow<'_, [u8]>> {
        self.view().data()
    }

    /// The host field-type code behind a decimal, temporal, or opaque
    /// value.
    pub fn field_type(&self) -> Option<FieldType> {
        self.view().field_type()
    }

    /// The packed form of a temporal value.
    pub fn get_datetime_packed(&self) -> Option<PackedTemporal> {
        self.view().packed_temporal().map(|(_, p)| p)
    }
}

impl<'v> View<'v> {
    pub(crate) fn json_type(&self) -> JsonType {
        match *self {
            View::Dom(v) => v.json_type(),
            View::Binary(b) => match b {
                BinValue::Null => JsonType::Null,
                BinValue::Bool(_) => JsonType::Boolean,
                BinValue::Int(_) => JsonType::Int,
                BinValue::Uint(_) => JsonType::Uint,
                BinValue::Double(_) => JsonType::Double,
                BinValue::String(_) => JsonType::String,
                BinValue::Array(_) => JsonType::Array,
                BinValue::Object(_) => JsonType::Object,
                BinValue::Opaque { field_type, .. } => match field_type {
                    FieldType::DECIMAL => JsonType::Decimal,
                    FieldType::DATE => JsonType::Date,
                    FieldType::TIME => JsonType::Time,
                    FieldType::DATETIME => JsonType::Datetime,
                    FieldType::TIMESTAMP => JsonType::Timestamp,
                    _ => JsonType::Opaque,
                },
            },
        }
    }

    pub(crate) fn length(&self) -> usize {
        match *self {
            View::Dom(JsonValue::Array(a)) => a.len(),
            View::Dom(JsonValue::Object(o)) => o.len(),
            View::Binary(BinValue::Array(c)) | View::Binary(BinValue::Object(c)) => {
                c.element_count()
            }
            _ => 1,
        }
    }

    pub(crate) fn element(&self, index: usize) -> Result<Option<View<'v>>, JsonError> {
        match *self {
            View::Dom(JsonValue::Array(a)) => Ok(a.get(index).map(View::Dom)),
            View::Binary(BinValue::Array(c)) => {
                if index < c.element_count() {
                    Ok(Some(View::Binary(c.element(index)?)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    pub(crate) fn lookup(&self, key: &str) -> Result<Option<View<'v>>, JsonError> {
        match *self {
            View::Dom(JsonValue::Object(o)) => Ok(o.get(key).map(View::Dom)),
            View::Binary(BinValue::Object(c)) => {
                Ok(c.lookup(key.as_bytes())?.map(View::Binary))
            }
            _ => Ok(None),
        }
    }

    /// Members in comparator order, keys as raw bytes.
    pub(crate) fn members(&self) -> Result<Vec<(Cow<'v, [u8]>, View<'v>)>, JsonError> {
        match *self {
            View::Dom(JsonValue::Object(o)) => Ok(o
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_bytes()), View::Dom(v)))
                .collect()),
            View::Binary(BinValue::Object(c)) => {
                let mut out = Vec::with_capacity(c.element_count());
                for i in 0..c.element_count() {
                    out.push((Cow::Borrowed(c.key(i)?), View::Binary(c.element(i)?)));
                }
                Ok(out)
            }
            _ => Ok(Vec::new()),
        }
    }

    pub(crate) fn as_int(&self) -> Option<i64> {
        match *self {
            View::Dom(JsonValue::Int(i)) => Some(*i),
            View::Binary(BinValue::Int(i)) => Some(i),
            _ => None,
        }
    }

    pub(crate) fn as_uint(&self) -> Option<u64> {
        match *self {
            View::Dom(JsonValue::Uint(u)) => Some(*u),
            View::Binary(BinValue::Uint(u)) => Some(u),
            _ => None,
        }
    }

    pub(crate) fn as_double(&self) -> Option<f64> {
        match *self {
            View::Dom(JsonValue::Double(d)) => Some(*d),
            View::Binary(BinValue::Double(d)) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match *self {
            View::Dom(JsonValue::Bool(b)) => Some(*b),
            View::Binary(BinValue::Bool(b)) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn data(&self) -> Option<Cow<'v, [u8]>> {
        match *self {
            View::Dom(JsonValue::Str(ref s)) => Some(Cow::Borrowed(s.as_bytes())),
            View::Dom(JsonValue::Opaque(ref op)) => Some(Cow::Borrowed(op.data.as_slice())),
            View::Binary(BinValue::String(s)) => Some(Cow::Borrowed(s)),
            View::Binary(BinValue::Opaque { data, .. }) => Some(Cow::Borrowed(data)),
            _ => None,
        }
    }

    pub(crate) fn field_type(&self) -> Option<FieldType> {
        match *self {
            View::Dom(JsonValue::Decimal(_)) => Some(FieldType::DECIMAL),
            View::Dom(JsonValue::Date(_)) => Some(FieldType::DATE),
            View::Dom(JsonValue::Time(_)) => Some(FieldType::TIME),
            View::Dom(JsonValue::Datetime(_)) => Some(FieldType::DATETIME),
            View::Dom(JsonValue::Timestamp(_)) => Some(FieldType::TIMESTAMP),
            View::Dom(JsonValue::Opaque(ref op)) => Some(op.field_type),
            View::Binary(BinValue::Opaque { field_type, .. }) => Some(field_type),
            _ => None,
        }
    }

    pub(crate) fn decimal(&self) -> Option<BigDecimal> {
        match *self {
            View::Dom(JsonValue::Decimal(ref d)) => Some(d.clone()),
            View::Binary(BinValue::Opaque { field_type, data })
                if field_type == FieldType::DECIMAL =>
            {
                std::str::from_utf8(data)
                    .ok()
                    .and_then(|s| BigDecimal::from_str(s).ok())
            }
            _ => None,
        }
    }

    pub(crate) fn packed_temporal(&self) -> Option<(TemporalKind, PackedTemporal)> {
        match *self {
            View::Dom(JsonValue::Date(p)) => Some((TemporalKind::Date, *p)),
            View::Dom(JsonValue::Time(p)) => Some((TemporalKind::Time, *p)),
            View::Dom(JsonValue::Datetime(p)) => Some((TemporalKind::Datetime, *p)),
            View::Dom(JsonValue::Timestamp(p)) => Some((TemporalKind::Timestamp, *p)),
            View::Binary(BinValue::Opaque { field_type, data }) => {
                let kind = match field_type {
                    FieldType::DATE => TemporalKind::Date,
                    FieldType::TIME => TemporalKind::Time,
                    FieldType::DATETIME => TemporalKind::Datetime,
                    FieldType::TIMESTAMP => TemporalKind::Timestamp,
                    _ => return None,
                };
                let bytes: [u8; PACKED_SIZE] = data.try_into().ok()?;
                Some((kind, PackedTemporal::from_le_bytes(bytes)))
            }
            _ => None,
        }
    }
}

/// Truncate `out` to the session's packet limit, warning on overflow.
fn enforce_packet_limit(session: &mut Session, out: &mut String) {
    if out.len() > session.max_allowed_packet {
        let mut limit = session.max_allowed_packet;
        while limit > 0 && !out.is_char_boundary(limit) {
            limit -= 1;
        }
        out.truncate(limit);
        session.push_warning(Warning::PacketOverflow {
            limit: session.max_allowed_packet,
        });
    }
}

/// Render a view as JSON text without materializing a DOM.
fn write_view_text(view: View<'_>, out: &mut String) -> Result<(), JsonError> {
    match view.json_type() {
        JsonType::Null => out.push_str("null"),
        JsonType::Boolean => {
            out.push_str(if view.as_bool() == Some(true) { "true" } else { "false" })
        }
        JsonType::Int => out.push_str(&view.as_int().unwrap_or(0).to_string()),
        JsonType::Uint => out.push_str(&view.as_uint().unwrap_or(0).to_string()),
        JsonType::Double => out.push_str(&format_double(view.as_double().unwrap_or(0.0))),
        JsonType::Decimal => match view.decimal() {
            Some(d) => out.push_str(&d.to_string()),
            None => out.push_str("0"),
        },
        JsonType::String => {
            let data = view.data().unwrap_or_default();
            let s = std::str::from_utf8(&data).map_err(|_| {
                JsonError::Binary(quartz_json_binary::BinaryError::Corrupt(
                    "invalid utf-8 in string",
                ))
            })?;
            quote_json_string(s, out);
        }
        JsonType::Date | JsonType::Time | JsonType::Datetime | JsonType::Timestamp => {
            if let Some((kind, packed)) = view.packed_temporal() {
                quote_json_string(&format_temporal(kind, packed), out);
            }
        }
        JsonType::Opaque => {
            let code = view.field_type().map(|ft| ft.0).unwrap_or(0);
            let data = view.data().unwrap_or_default();
            let text = format!("base64:type{}:{}", code, BASE64.encode(data.as_ref()));
            quote_json_string(&text, out);
        }
        JsonType::Array => {
            out.push('[');
            for i in 0..view.length() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(child) = view.element(i)? {
                    write_view_text(child, out)?;
                }
            }
            out.push(']');
        }
        JsonType::Object => {
            out.push('{');
            for (i, (key, child)) in view.members()?.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let key = String::from_utf8_lossy(&key);
                quote_json_string(&key, out);
                out.push_str(": ");
                write_view_text(child, out)?;
            }
            out.push('}');
        }
        JsonType::Error => {}
    }
    Ok(())
}
