//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value as Json};

use anchor_kernel_core::Keypair;
use anchor_kernel_perms::Permissions;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate any permission mask with known bits.
pub fn permissions() -> impl Strategy<Value = Permissions> {
    (0u32..8).prop_map(Permissions::from_bits_truncate)
}

/// Generate a field name.
pub fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,11}".prop_map(String::from)
}

fn leaf() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i64>().prop_map(Json::from),
        any::<u64>().prop_map(Json::from),
        (-1.0e9f64..1.0e9f64).prop_filter_map("finite", |f| Number::from_f64(f).map(Json::Number)),
        ".{0,16}".prop_map(Json::String),
    ]
}

/// Generate an arbitrary JSON value, nested up to a few levels.
pub fn json_value() -> impl Strategy<Value = Json> {
    leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
            prop::collection::btree_map(field_name(), inner, 0..6)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate a keyed record, the only shape the canonical encoder accepts.
pub fn json_record() -> impl Strategy<Value = Json> {
    prop::collection::btree_map(field_name(), json_value(), 0..8)
        .prop_map(|m| Json::Object(m.into_iter().collect::<Map<_, _>>()))
}

/// Rebuild a value with every object's keys rotated by `shift`, at every
/// nesting level.
pub fn permute_keys(value: &Json, shift: usize) -> Json {
    match value {
        Json::Object(map) => {
            let mut entries: Vec<(&String, &Json)> = map.iter().collect();
            if !entries.is_empty() {
                let len = entries.len();
                entries.rotate_left(shift % len);
                entries.reverse();
            }
            Json::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), permute_keys(v, shift)))
                    .collect(),
            )
        }
        Json::Array(items) => Json::Array(items.iter().map(|v| permute_keys(v, shift)).collect()),
        other => other.clone(),
    }
}

/// Generate a record together with a key-order permutation of it.
pub fn record_with_permutation() -> impl Strategy<Value = (Json, Json)> {
    (json_record(), any::<usize>()).prop_map(|(record, shift)| {
        let permuted = permute_keys(&record, shift);
        (record, permuted)
    })
}
