//! Seeded differential suite: random documents pushed through every
//! representation, checking the round-trip and ordering laws hold on
//! shapes no hand-written fixture covers.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use quartz_json::{parse_text, serialize_text, JsonWrapper, Session};
use quartz_json_binary::{parse_binary, serialize, to_dom};
use quartz_json_dom::{JsonArray, JsonObject, JsonValue};

fn random_scalar(rng: &mut StdRng) -> JsonValue {
    match rng.gen_range(0..6) {
        0 => JsonValue::Null,
        1 => JsonValue::Bool(rng.gen()),
        2 => JsonValue::Int(rng.gen()),
        3 => JsonValue::Uint(rng.gen()),
        4 => {
            // Finite doubles only.
            let mantissa: i64 = rng.gen_range(-1_000_000..1_000_000);
            let exp: i32 = rng.gen_range(-20..20);
            JsonValue::Double(mantissa as f64 * 10f64.powi(exp))
        }
        _ => {
            let len = rng.gen_range(0..12);
            let s: String = (0..len)
                .map(|_| char::from(rng.gen_range(b' '..=b'~')))
                .collect();
            JsonValue::Str(s)
        }
    }
}

fn random_value(rng: &mut StdRng, depth: usize) -> JsonValue {
    if depth >= 4 || rng.gen_range(0..3) == 0 {
        return random_scalar(rng);
    }
    if rng.gen() {
        let mut arr = JsonArray::new();
        for _ in 0..rng.gen_range(0..6) {
            arr.append_alias(random_value(rng, depth + 1));
        }
        JsonValue::Array(arr)
    } else {
        let mut obj = JsonObject::new();
        for _ in 0..rng.gen_range(0..6) {
            let len = rng.gen_range(1..8);
            let key: String = (0..len)
                .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
                .collect();
            obj.add_alias(key, random_value(rng, depth + 1));
        }
        JsonValue::Object(obj)
    }
}

#[test]
fn random_documents_round_trip_all_forms() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    for _ in 0..200 {
        let value = random_value(&mut rng, 1);

        let text = serialize_text(&value);
        let reparsed = parse_text(text.as_bytes(), false).unwrap();
        assert_eq!(value, reparsed, "text round trip failed for {text}");

        let bytes = serialize(&value).unwrap();
        let materialized = to_dom(&parse_binary(&bytes).unwrap()).unwrap();
        assert_eq!(value, materialized, "binary round trip failed for {text}");
    }
}

#[test]
fn random_pairs_compare_antisymmetrically() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    for _ in 0..200 {
        let a = random_value(&mut rng, 1);
        let b = random_value(&mut rng, 1);
        let bin_a = serialize(&a).unwrap();

        // Mix representations: binary on one side, DOM on the other.
        let wa = JsonWrapper::parse_binary_doc(&bin_a).unwrap();
        let wb = JsonWrapper::from_dom(b);
        let ab = wa.compare(&wb).unwrap();
        let ba = wb.compare(&wa).unwrap();
        assert_eq!(ab, ba.reverse());
    }
}

#[test]
fn random_scalars_sort_key_agrees_with_compare() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0003);
    let mut session = Session::new();
    for _ in 0..300 {
        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);
        let wa = JsonWrapper::from_dom(a);
        let wb = JsonWrapper::from_dom(b);

        let mut ka = [0u8; 192];
        let mut kb = [0u8; 192];
        let na = wa.make_sort_key(&mut session, &mut ka).unwrap();
        let nb = wb.make_sort_key(&mut session, &mut kb).unwrap();

        let key_order = ka[..na].cmp(&kb[..nb]);
        let value_order = wa.compare(&wb).unwrap();
        if value_order != Ordering::Equal {
            assert_eq!(key_order, value_order, "sort key order diverged");
        } else {
            assert_eq!(key_order, Ordering::Equal, "equal values got unequal keys");
        }
    }
}

#[test]
fn random_documents_hash_identically_across_forms() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0004);
    for _ in 0..100 {
        let value = random_value(&mut rng, 1);
        let bytes = serialize(&value).unwrap();
        let w_dom = JsonWrapper::from_dom(value);
        let w_bin = JsonWrapper::parse_binary_doc(&bytes).unwrap();
        assert_eq!(
            w_dom.make_hash_key(3).unwrap(),
            w_bin.make_hash_key(3).unwrap()
        );
    }
}

#[test]
fn random_in_place_updates_match_dom_edits() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0005);
    let mut applied = 0;
    for _ in 0..200 {
        // An array of strings gives update targets with slack.
        let mut arr = JsonArray::new();
        let count = rng.gen_range(1..6);
        for _ in 0..count {
            let len = rng.gen_range(0..10);
            let s: String = (0..len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect();
            arr.append_alias(JsonValue::Str(s));
        }
        let value = JsonValue::Array(arr);
        let original = serialize(&value).unwrap();

        let index = rng.gen_range(0..count);
        let new_len = rng.gen_range(0..10);
        let new_value =
            JsonValue::Str((0..new_len).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect());

        let path = quartz_json::JsonPath::parse(&format!("$[{index}]")).unwrap();
        let mut result = Vec::new();
        let mut w = JsonWrapper::parse_binary_doc(&original).unwrap();
        let status = w
            .update_in_place(&path, &new_value, true, &mut result)
            .unwrap();

        if status.partially_updated && status.replaced_path {
            applied += 1;
            // Equal to the DOM edit.
            let mut tree = value.clone();
            if let JsonValue::Array(a) = &mut tree {
                a.replace(index, new_value);
            }
            assert_eq!(w.clone_dom().unwrap(), tree);
            // Never grows.
            drop(w);
            assert_eq!(result.len(), original.len());
        }
    }
    // The corpus is built so a healthy share of updates fit in place.
    assert!(applied > 50, "only {applied} updates applied in place");
}
