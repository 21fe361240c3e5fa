//! Hash-key generation: a rolling 64-bit checksum over the value.
//!
//! All numeric kinds hash through their double representation so
//! numerically equal scalars of different kinds collide, and zero
//! hashes as a single byte so `+0.0` and `-0.0` agree. Containers
//! fold their kind tag and each child's hash, seeding every child
//! with the accumulator so far.

use crate::error::JsonError;
use crate::sortkey::{KEY_ARRAY, KEY_FALSE, KEY_NULL, KEY_OBJECT, KEY_TRUE};
use crate::wrapper::{JsonWrapper, View};
use quartz_json_dom::JsonType;

use bigdecimal::ToPrimitive;

struct HashKey {
    crc: u64,
}

impl HashKey {
    fn new(seed: u64) -> Self {
        Self { crc: seed }
    }

    fn add_byte(&mut self, byte: u8) {
        let crc = self.crc;
        self.crc = crc
            .wrapping_shl(8)
            .wrapping_add(byte as u64)
            .wrapping_add(crc >> 56);
    }

    fn add_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.add_byte(b);
        }
    }

    fn add_integer(&mut self, value: u64) {
        self.add_bytes(&value.to_le_bytes());
    }

    fn add_double(&mut self, value: f64) {
        // A single byte for zero keeps +0.0 and -0.0 identical.
        if value == 0.0 {
            self.add_byte(0);
            return;
        }
        self.add_bytes(&value.to_le_bytes());
    }
}

impl JsonWrapper<'_> {
    /// Fold this value into a 64-bit hash, continuing from `seed`.
    pub fn make_hash_key(&self, seed: u64) -> Result<u64, JsonError> {
        hash_view(self.view(), seed)
    }
}

fn hash_view(view: View<'_>, seed: u64) -> Result<u64, JsonError> {
    let mut key = HashKey::new(seed);
    match view.json_type() {
        JsonType::Null => key.add_byte(KEY_NULL),
        JsonType::Boolean => key.add_byte(if view.as_bool() == Some(true) {
            KEY_TRUE
        } else {
            KEY_FALSE
        }),
        JsonType::Int => key.add_double(view.as_int().unwrap_or(0) as f64),
        JsonType::Uint => key.add_double(view.as_uint().unwrap_or(0) as f64),
        JsonType::Double => key.add_double(view.as_double().unwrap_or(0.0)),
        JsonType::Decimal => {
            let d = view.decimal().unwrap_or_default();
            key.add_double(d.to_f64().unwrap_or(0.0));
        }
        JsonType::String | JsonType::Opaque => {
            key.add_bytes(&view.data().unwrap_or_default());
        }
        JsonType::Date | JsonType::Time | JsonType::Datetime | JsonType::Timestamp => {
            if let Some((_, packed)) = view.packed_temporal() {
                key.add_bytes(&packed.to_le_bytes());
            }
        }
        JsonType::Array => {
            key.add_byte(KEY_ARRAY);
            for i in 0..view.length() {
                if let Some(child) = view.element(i)? {
                    let child_hash = hash_view(child, key.crc)?;
                    key.add_integer(child_hash);
                }
            }
        }
        JsonType::Object => {
            key.add_byte(KEY_OBJECT);
            for (name, child) in view.members()? {
                key.add_bytes(&name);
                let child_hash = hash_view(child, key.crc)?;
                key.add_integer(child_hash);
            }
        }
        JsonType::Error => {}
    }
    Ok(key.crc)
}
