use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::node::SharedValue;

/// Merge a new snapshot into an old one, preserving `Arc` identity for every
/// subtree whose value did not change.
///
/// The result is always deep-equal to `new`. Wherever a subtree of `new`
/// carries the same value as the corresponding subtree of `old`, the returned
/// tree holds the *old* pointer, so downstream consumers keyed on pointer
/// identity (or on [slot versions](crate::state::LoaderSnapshot::version))
/// see no spurious change when repolled data comes back value-identical.
///
/// Rules, applied depth-first:
///
/// 1. Pointer-equal inputs short-circuit to `old`.
/// 2. Array × array: elements merge index-by-index; elements past the old
///    length copy from `new`. A length mismatch or any element yielding a new
///    pointer produces a fresh array (which still reuses every unchanged
///    element pointer); otherwise the old array pointer is returned.
/// 3. If exactly one side is `Null`, `new` wins outright: there is no
///    partial merge against an absent value. Two `Null`s are the same value
///    and keep the old pointer.
/// 4. Object × object: key sets are compared for full set equality (size plus
///    containment). Each entry of `new` merges against the old entry of the
///    same key. Equal key sets with all entries pointer-unchanged return the
///    old object pointer; anything else produces a fresh object reusing
///    unchanged entry pointers.
/// 5. Everything else compares by value: equal leaves keep the old pointer,
///    differing or shape-mismatched nodes take `new`.
///
/// The function is total and pure: neither input is mutated, no error
/// conditions exist, and concurrent callers need no coordination.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tributary::merge::{SharedValue, structural_merge};
/// use serde_json::json;
///
/// let old = SharedValue::from_value(json!({"a": {"b": 1}, "c": {"d": 2}}));
/// let new = SharedValue::from_value(json!({"a": {"b": 7}, "c": {"d": 2}}));
///
/// let merged = structural_merge(&old, &new);
/// assert_eq!(merged.to_value(), json!({"a": {"b": 7}, "c": {"d": 2}}));
/// // The untouched sibling kept its identity.
/// assert!(Arc::ptr_eq(merged.get("c").unwrap(), old.get("c").unwrap()));
/// assert!(!Arc::ptr_eq(merged.get("a").unwrap(), old.get("a").unwrap()));
/// ```
pub fn structural_merge(old: &Arc<SharedValue>, new: &Arc<SharedValue>) -> Arc<SharedValue> {
    if Arc::ptr_eq(old, new) {
        return Arc::clone(old);
    }

    match (old.as_ref(), new.as_ref()) {
        (SharedValue::Array(old_items), SharedValue::Array(new_items)) => {
            let mut changed = old_items.len() != new_items.len();
            let mut merged = Vec::with_capacity(new_items.len());
            for (index, new_item) in new_items.iter().enumerate() {
                match old_items.get(index) {
                    Some(old_item) => {
                        let item = structural_merge(old_item, new_item);
                        if !Arc::ptr_eq(&item, old_item) {
                            changed = true;
                        }
                        merged.push(item);
                    }
                    None => {
                        changed = true;
                        merged.push(Arc::clone(new_item));
                    }
                }
            }
            if changed {
                Arc::new(SharedValue::Array(merged))
            } else {
                Arc::clone(old)
            }
        }
        // Two nulls are the same value; the sentinel rule below only applies
        // when exactly one side is absent.
        (SharedValue::Null, SharedValue::Null) => Arc::clone(old),
        (SharedValue::Null, _) | (_, SharedValue::Null) => Arc::clone(new),
        (SharedValue::Object(old_entries), SharedValue::Object(new_entries)) => {
            // Size equality plus containment of every new key is full
            // bidirectional set equality.
            let same_keys = old_entries.len() == new_entries.len()
                && new_entries.keys().all(|key| old_entries.contains_key(key));
            let mut changed = !same_keys;
            let mut merged: FxHashMap<String, Arc<SharedValue>> =
                FxHashMap::with_capacity_and_hasher(new_entries.len(), Default::default());
            for (key, new_entry) in new_entries.iter() {
                match old_entries.get(key) {
                    Some(old_entry) => {
                        let entry = structural_merge(old_entry, new_entry);
                        if !Arc::ptr_eq(&entry, old_entry) {
                            changed = true;
                        }
                        merged.insert(key.clone(), entry);
                    }
                    None => {
                        changed = true;
                        merged.insert(key.clone(), Arc::clone(new_entry));
                    }
                }
            }
            if changed {
                Arc::new(SharedValue::Object(merged))
            } else {
                Arc::clone(old)
            }
        }
        (old_leaf, new_leaf) => {
            if old_leaf == new_leaf {
                Arc::clone(old)
            } else {
                Arc::clone(new)
            }
        }
    }
}

/// Merge an owned `serde_json::Value` into an existing shared tree.
///
/// Convenience over [`structural_merge`] for the common case where the new
/// snapshot arrives as a freshly decoded response body.
pub fn structural_merge_value(old: &Arc<SharedValue>, new: Value) -> Arc<SharedValue> {
    structural_merge(old, &SharedValue::from_value(new))
}
