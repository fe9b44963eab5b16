//! Generic configuration document model
//!
//! A [`ConfigNode`] is an ordered mapping from field name to [`Value`]. The
//! order of fields is kept exactly as read so that a document written back
//! to disk diffs cleanly against its source.
//!
//! Accessors never panic on missing or mistyped fields: reads either return
//! `Option` or take an explicit default.

use serde::{Deserialize, Serialize};

pub use serde_json::{Map, Value};

/// One JSON object, the unit every configuration document is made of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigNode(Map<String, Value>);

impl ConfigNode {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value; only objects can become nodes.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.0.get_mut(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// The field as a string, if it is one.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// The field as an owned string, empty when missing or not a string.
    pub fn str_or_default(&self, field: &str) -> String {
        self.get_str(field).unwrap_or_default().to_string()
    }

    pub fn bool_or(&self, field: &str, default: bool) -> bool {
        self.0.get(field).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.0.get(field).and_then(Value::as_array)
    }

    pub fn get_array_mut(&mut self, field: &str) -> Option<&mut Vec<Value>> {
        self.0.get_mut(field).and_then(Value::as_array_mut)
    }

    pub fn get_object(&self, field: &str) -> Option<&Map<String, Value>> {
        self.0.get(field).and_then(Value::as_object)
    }

    /// Set a field. An existing field keeps its position; a new one is appended.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Remove `field`, keeping the order of the remaining fields.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        self.0.shift_remove(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ConfigNode {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ConfigNode> for Value {
    fn from(node: ConfigNode) -> Self {
        node.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigNode {
        ConfigNode::from_value(json!({
            "name": "Widget",
            "enabled": true,
            "modules": ["a.json", "b.json"],
            "nested": {"x": 1}
        }))
        .unwrap()
    }

    #[test]
    fn typed_accessors() {
        let node = sample();
        assert_eq!(node.get_str("name"), Some("Widget"));
        assert_eq!(node.str_or_default("missing"), "");
        assert_eq!(node.str_or_default("enabled"), "");
        assert!(node.bool_or("enabled", false));
        assert!(node.bool_or("missing", true));
        assert_eq!(node.get_array("modules").map(Vec::len), Some(2));
        assert!(node.get_object("nested").is_some());
        assert!(node.get_object("name").is_none());
    }

    #[test]
    fn only_objects_become_nodes() {
        assert!(ConfigNode::from_value(json!([1, 2])).is_none());
        assert!(ConfigNode::from_value(json!("text")).is_none());
    }

    #[test]
    fn set_keeps_field_position() {
        let mut node = sample();
        node.set("name", "Gadget");
        node.set("added", 3);
        let keys: Vec<_> = node.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name", "enabled", "modules", "nested", "added"]);
        assert_eq!(node.get_str("name"), Some("Gadget"));
    }
}
