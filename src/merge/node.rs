use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{Number, Value};

/// An immutable JSON-like tree whose composite nodes hold their children
/// behind [`Arc`] pointers, so unchanged subtrees can be shared between
/// successive snapshots of the same data.
///
/// `SharedValue` mirrors the `serde_json::Value` data model. The difference
/// is ownership: arrays and objects store `Arc<SharedValue>` children, which
/// lets [`structural_merge`](crate::merge::structural_merge) return the old
/// pointer for any subtree whose value did not change. Consumers detect
/// change with [`Arc::ptr_eq`] instead of deep comparison.
///
/// # Examples
///
/// ```rust
/// use tributary::merge::SharedValue;
/// use serde_json::json;
///
/// let tree = SharedValue::from_value(json!({"a": {"b": 1}, "c": [1, 2]}));
/// assert_eq!(tree.get("a").and_then(|a| a.get("b")).and_then(|b| b.as_i64()), Some(1));
/// assert_eq!(tree.to_value(), json!({"a": {"b": 1}, "c": [1, 2]}));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SharedValue {
    /// The null / absent sentinel.
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Ordered sequence with `Arc`-shared elements.
    Array(Vec<Arc<SharedValue>>),
    /// Keyed mapping with `Arc`-shared entries.
    Object(FxHashMap<String, Arc<SharedValue>>),
}

impl SharedValue {
    /// Convert an owned `serde_json::Value` into a shared tree.
    ///
    /// Every composite node gets its own `Arc`; leaves are moved, not cloned.
    pub fn from_value(value: Value) -> Arc<Self> {
        Arc::new(SharedValue::from(value))
    }

    /// Rebuild an owned `serde_json::Value` from this tree.
    ///
    /// This is a deep copy; use it at serialization boundaries, not on hot
    /// change-detection paths.
    pub fn to_value(&self) -> Value {
        match self {
            SharedValue::Null => Value::Null,
            SharedValue::Bool(b) => Value::Bool(*b),
            SharedValue::Number(n) => Value::Number(n.clone()),
            SharedValue::String(s) => Value::String(s.clone()),
            SharedValue::Array(items) => {
                Value::Array(items.iter().map(|item| item.to_value()).collect())
            }
            SharedValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// Look up an object entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Arc<SharedValue>> {
        match self {
            SharedValue::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Look up an array element by index.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Arc<SharedValue>> {
        match self {
            SharedValue::Array(items) => items.get(index),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&FxHashMap<String, Arc<SharedValue>>> {
        match self {
            SharedValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Arc<SharedValue>]> {
        match self {
            SharedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SharedValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SharedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SharedValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SharedValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SharedValue::Null)
    }
}

impl From<Value> for SharedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SharedValue::Null,
            Value::Bool(b) => SharedValue::Bool(b),
            Value::Number(n) => SharedValue::Number(n),
            Value::String(s) => SharedValue::String(s),
            Value::Array(items) => {
                SharedValue::Array(items.into_iter().map(SharedValue::from_value).collect())
            }
            Value::Object(entries) => SharedValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, SharedValue::from_value(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&SharedValue> for Value {
    fn from(node: &SharedValue) -> Self {
        node.to_value()
    }
}

impl fmt::Display for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
