//! Core types shared by the flow model and the extraction engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// NodeId: opaque, stable identifier assigned by the host runtime
pub type NodeId = String;

/// A single node of the flow graph.
///
/// Wraps the raw JSON object so that fields this crate does not know about
/// pass through untouched and in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRecord(pub Map<String, Value>);

impl NodeRecord {
    pub fn new() -> Self {
        NodeRecord(Map::new())
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(NodeRecord(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn id(&self) -> Option<&str> {
        self.str_field("id")
    }

    pub fn node_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// Owning tab or subflow id
    pub fn z(&self) -> Option<&str> {
        self.str_field("z")
    }

    /// String value of a field; non-string values read as absent
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Non-empty after trimming whitespace
    pub fn has_text(&self, key: &str) -> bool {
        self.str_field(key)
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a string field; returns true when the stored value changed
    pub fn set_str(&mut self, key: &str, value: &str) -> bool {
        if self.str_field(key) == Some(value) {
            return false;
        }
        self.0.insert(key.to_string(), Value::String(value.to_string()));
        true
    }
}

impl From<Map<String, Value>> for NodeRecord {
    fn from(map: Map<String, Value>) -> Self {
        NodeRecord(map)
    }
}
