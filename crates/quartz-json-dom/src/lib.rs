//! In-memory document object model for the quartzdb JSON column type.
//!
//! A [`JsonValue`] is a closed sum over fourteen kinds: the six kinds
//! JSON text can express, plus decimals, temporal values, and opaque
//! host blobs that only exist once a value has passed through the
//! column storage layer. Containers own their children exclusively;
//! object members are kept sorted by the key comparator (shorter key
//! first, ties broken bytewise) so member lookup is a binary search
//! and iteration order is deterministic.
//!
//! Parsing ([`parse_text`]) and serialization ([`serialize_text`])
//! round-trip any tree up to [`MAX_DEPTH`] nesting levels.

mod error;
mod interop;
mod merge;
mod parser;
mod seek;
mod serializer;
mod temporal;
mod value;

pub use error::{DomError, MAX_DEPTH};
pub use interop::to_serde_value;
pub use merge::merge_doms;
pub use parser::{is_valid_json_syntax, parse_text};
pub use seek::{path_to, seek};
pub use serializer::{
    format_double, quote_json_string, serialize_pretty, serialize_text, serialize_text_into,
};
pub use temporal::{format_temporal, PackedTemporal, TemporalKind, PACKED_SIZE};
pub use value::{key_cmp, FieldType, JsonArray, JsonObject, JsonType, JsonValue, OpaqueValue};
