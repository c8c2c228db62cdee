//! Structural merge properties: deep equality with the new snapshot, maximal
//! reference reuse from the old one.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Value, json};

use tributary::merge::{SharedValue, structural_merge};

#[test]
fn identity_short_circuit() {
    let tree = SharedValue::from_value(json!({"a": {"b": 1}, "c": [1, 2, 3]}));
    assert!(Arc::ptr_eq(&structural_merge(&tree, &tree), &tree));
}

#[test]
fn value_equal_clone_returns_old_root() {
    let value = json!({"a": {"b": 1}, "c": {"d": 2}, "list": [1, [2, 3], {"x": null}]});
    let old = SharedValue::from_value(value.clone());
    let new = SharedValue::from_value(value);
    let merged = structural_merge(&old, &new);
    assert!(Arc::ptr_eq(&merged, &old));
}

#[test]
fn changed_nested_key_keeps_sibling_reference() {
    let old = SharedValue::from_value(json!({"a": {"b": 1}, "c": {"d": 2}}));
    let new = SharedValue::from_value(json!({"a": {"b": 99}, "c": {"d": 2}}));

    let merged = structural_merge(&old, &new);
    assert!(!Arc::ptr_eq(&merged, &old));
    assert_eq!(merged.to_value(), json!({"a": {"b": 99}, "c": {"d": 2}}));

    // The changed branch is new, the untouched sibling is the old pointer.
    assert!(!Arc::ptr_eq(merged.get("a").unwrap(), old.get("a").unwrap()));
    assert!(Arc::ptr_eq(merged.get("c").unwrap(), old.get("c").unwrap()));
}

#[test]
fn shortened_array_is_a_new_reference() {
    let old = SharedValue::from_value(json!([1, 2, 3]));
    let new = SharedValue::from_value(json!([1, 2]));
    let merged = structural_merge(&old, &new);
    assert!(!Arc::ptr_eq(&merged, &old));
    assert_eq!(merged.to_value(), json!([1, 2]));
}

#[test]
fn extended_array_copies_extra_elements() {
    let old = SharedValue::from_value(json!([{"x": 1}]));
    let new = SharedValue::from_value(json!([{"x": 1}, {"y": 2}]));
    let merged = structural_merge(&old, &new);
    assert!(!Arc::ptr_eq(&merged, &old));
    assert_eq!(merged.to_value(), json!([{"x": 1}, {"y": 2}]));
    // The element that existed before keeps its identity.
    assert!(Arc::ptr_eq(
        merged.get_index(0).unwrap(),
        old.get_index(0).unwrap()
    ));
}

#[test]
fn single_changed_element_keeps_neighbor_references() {
    let old = SharedValue::from_value(json!([{"x": 1}, {"y": 2}, {"z": 3}]));
    let new = SharedValue::from_value(json!([{"x": 1}, {"y": 42}, {"z": 3}]));

    let merged = structural_merge(&old, &new);
    assert!(!Arc::ptr_eq(&merged, &old));
    assert!(Arc::ptr_eq(
        merged.get_index(0).unwrap(),
        old.get_index(0).unwrap()
    ));
    assert!(!Arc::ptr_eq(
        merged.get_index(1).unwrap(),
        old.get_index(1).unwrap()
    ));
    assert!(Arc::ptr_eq(
        merged.get_index(2).unwrap(),
        old.get_index(2).unwrap()
    ));
}

#[test]
fn type_mismatch_replaces_wholesale() {
    let old = SharedValue::from_value(json!({"a": 1}));
    let new = SharedValue::from_value(json!([1]));
    assert!(Arc::ptr_eq(&structural_merge(&old, &new), &new));
}

#[test]
fn deep_unchanged_subtree_survives_distant_change() {
    let old = SharedValue::from_value(json!({
        "groups": [{"id": 1, "tags": {"env": "prod"}}, {"id": 2, "tags": {"env": "dev"}}],
        "meta": {"cursor": "abc"},
    }));
    let new = SharedValue::from_value(json!({
        "groups": [{"id": 1, "tags": {"env": "prod"}}, {"id": 2, "tags": {"env": "dev"}}],
        "meta": {"cursor": "def"},
    }));

    let merged = structural_merge(&old, &new);
    assert!(!Arc::ptr_eq(&merged, &old));
    // The whole groups channel kept its identity; only meta changed.
    assert!(Arc::ptr_eq(
        merged.get("groups").unwrap(),
        old.get("groups").unwrap()
    ));
    assert!(!Arc::ptr_eq(
        merged.get("meta").unwrap(),
        old.get("meta").unwrap()
    ));
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// The merge result is always deep-equal to the new snapshot.
    #[test]
    fn merge_result_deep_equals_new(old in arb_json(), new in arb_json()) {
        let old_tree = SharedValue::from_value(old);
        let new_tree = SharedValue::from_value(new.clone());
        let merged = structural_merge(&old_tree, &new_tree);
        prop_assert_eq!(merged.to_value(), new);
    }

    /// Merging a value-identical rebuild always returns the old root pointer.
    #[test]
    fn self_merge_is_pointer_stable(value in arb_json()) {
        let old = SharedValue::from_value(value.clone());
        let rebuilt = SharedValue::from_value(value);
        let merged = structural_merge(&old, &rebuilt);
        prop_assert!(Arc::ptr_eq(&merged, &old));
    }

    /// Neither input is ever mutated.
    #[test]
    fn inputs_are_untouched(old in arb_json(), new in arb_json()) {
        let old_tree = SharedValue::from_value(old.clone());
        let new_tree = SharedValue::from_value(new.clone());
        let _ = structural_merge(&old_tree, &new_tree);
        prop_assert_eq!(old_tree.to_value(), old);
        prop_assert_eq!(new_tree.to_value(), new);
    }
}
