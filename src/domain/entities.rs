//! Value types shared by the arena: handles, keys and payloads.

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Handle to a node stored in a [`TreeArena`](crate::domain::TreeArena).
///
/// Handles are cheap to copy. A handle outlives the node it points at: once the
/// node is discarded the generation no longer matches and lookups return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl NodeId {
    pub(crate) fn index(self) -> Index {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}v{}", slot, generation)
    }
}

/// Opaque node identifier.
///
/// Ancestor and cycle checks compare keys, never handles. Uniqueness is the
/// caller's responsibility when keys are supplied explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Fresh random key (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for NodeKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Key/value data attached to a node.
///
/// Keys enumerate in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the entries of a JSON object. Anything that is not an object
    /// yields an empty payload.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self(map.clone()),
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the previous value stored under `key`, if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        // shift_remove keeps the remaining keys in insertion order
        self.0.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_keys_are_distinct() {
        let a = NodeKey::generate();
        let b = NodeKey::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_payload_keeps_insertion_order() {
        let payload = Payload::from_value(&json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = payload.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_payload_from_non_object_is_empty() {
        assert!(Payload::from_value(&json!([1, 2, 3])).is_empty());
        assert!(Payload::from_value(&json!("name")).is_empty());
        assert!(Payload::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn test_payload_get_set_has_remove() {
        let mut payload = Payload::new();
        assert!(!payload.has("name"));
        assert_eq!(payload.set("name", "a"), None);
        assert_eq!(payload.set("size", 3), None);
        assert_eq!(payload.get("name"), Some(&json!("a")));
        assert_eq!(payload.set("name", "b"), Some(json!("a")));
        assert_eq!(payload.remove("name"), Some(json!("b")));
        assert!(!payload.has("name"));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_payload_copy_is_independent() {
        let source = json!({"name": "a"});
        let mut payload = Payload::from_value(&source);
        payload.set("name", "changed");
        assert_eq!(source["name"], json!("a"));
    }
}
