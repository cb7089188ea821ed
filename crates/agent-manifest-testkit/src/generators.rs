//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use agent_manifest_core::{KeyMaterial, Manifest, ManifestKey};

/// Generate a 32-byte seed.
pub fn seed() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

/// Generate a signing key.
pub fn manifest_key() -> impl Strategy<Value = ManifestKey> {
    seed().prop_map(|seed| {
        ManifestKey::import(&KeyMaterial::RawSeed(seed)).expect("every 32-byte seed imports")
    })
}

/// Generate an object key, mixing ASCII, case, and multi-byte characters.
pub fn object_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,11}",
        "[a-zé\u{00e0}-\u{00ff}\u{ff21}-\u{ff3a}]{1,6}",
        any::<String>().prop_filter("bounded length", |s| s.len() <= 16),
    ]
}

/// Generate a JSON scalar. Floats are excluded: an integral float
/// canonicalizes to integer text and would not parse back to the same `Value`.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        any::<u64>().prop_map(|n| Value::Number(Number::from(n))),
        any::<String>().prop_map(Value::String),
    ]
}

/// Generate an arbitrary JSON value up to a small depth.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((object_key(), inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Generate a manifest with at least one field.
///
/// Field names never collide with the reserved envelope fields.
pub fn manifest() -> impl Strategy<Value = Manifest> {
    prop::collection::vec((object_key(), json_value()), 1..8).prop_filter_map(
        "needs at least one non-reserved field",
        |entries| {
            let fields: Map<String, Value> = entries
                .into_iter()
                .filter(|(k, _)| k != "trust" && k != "signature")
                .collect();
            if fields.is_empty() {
                return None;
            }
            Manifest::from_map(fields).ok()
        },
    )
}

/// Rebuild `value` with every object's entries in reverse insertion order.
///
/// Only representation changes; the value is equal as JSON.
pub fn reverse_key_order(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .rev()
                .map(|(k, v)| (k.clone(), reverse_key_order(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(reverse_key_order).collect()),
        other => other.clone(),
    }
}

/// A manifest and a second copy authored in a different key order.
pub fn manifest_with_reordered_copy() -> impl Strategy<Value = (Manifest, Manifest)> {
    manifest().prop_map(|m| {
        let reordered = reverse_key_order(&Value::from(m.clone()));
        let copy = Manifest::from_value(reordered).expect("reordering keeps an object");
        (m, copy)
    })
}
