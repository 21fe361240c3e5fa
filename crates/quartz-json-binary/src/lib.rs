//! Binary storage format for the quartzdb JSON column type.
//!
//! A document is `<type byte><payload>`. Containers are
//! length-prefixed and carry packed entry tables so any child can be
//! reached in O(1) (arrays) or O(log n) (object key lookup) without
//! touching its siblings. Each container is written in either the
//! small (16-bit counts and offsets) or large (32-bit) encoding,
//! whichever it needs; literals and integers that fit in an entry's
//! offset field are inlined into the entry table.
//!
//! The reader borrows from the document slice and never allocates.
//! The shadow-copy operations in [`shadow`] patch a destination
//! buffer seeded from the original bytes so concurrent readers of the
//! original never observe a torn write.

mod constants;
mod error;
mod materialize;
mod reader;
mod shadow;
mod writer;

pub use constants::*;
pub use error::BinaryError;
pub use materialize::to_dom;
pub use reader::{parse_binary, read_varlen, BinContainer, BinValue};
pub use shadow::payload_extent;
pub use writer::{inline_value, raw_binary, serialize, space_needed, write_varlen};
