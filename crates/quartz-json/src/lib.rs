//! Dual-representation JSON values for the quartzdb JSON column type.
//!
//! A [`JsonWrapper`] holds either a DOM (owned or aliased into a
//! surrounding document) or a binary value borrowed from column
//! storage, and exposes the union interface the SQL layer works
//! against: kind and length inspection, element and member access,
//! path seek, total-order comparison, sort-key and hash-key
//! generation, coercion to scalar SQL types, and partial in-place
//! update against the binary form.
//!
//! ```
//! use quartz_json::{parse_text, JsonPath, JsonWrapper};
//!
//! let dom = parse_text(br#"{"a": [1, 2, 3]}"#, false).unwrap();
//! let mut doc = JsonWrapper::from_dom(dom);
//! let path = JsonPath::parse("$.a[last]").unwrap();
//! let hits = doc.seek(&path, true, false).unwrap();
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].get_int(), Some(3));
//! ```

mod coerce;
mod compare;
mod error;
mod hash;
mod seek;
mod session;
mod sortkey;
mod update;
mod wrapper;

pub use error::JsonError;
pub use session::{Session, Warning};
pub use sortkey::MAX_NUMBER_SORT_PAD;
pub use update::{PartialUpdateStatus, RemoveStatus};
pub use wrapper::JsonWrapper;

// The pieces callers typically want alongside the wrapper.
pub use quartz_json_binary::{parse_binary, serialize, BinValue};
pub use quartz_json_dom::{
    merge_doms, parse_text, serialize_text, JsonType, JsonValue, MAX_DEPTH,
};
pub use quartz_json_path::{JsonPath, PathLeg};
