use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field set carried by an action: the full entity for a create, the changed fields for an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionPayload(Map<String, Value>);

impl ActionPayload {
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Whether any top-level string value equals `id`.
    pub fn references(&self, id: &str) -> bool {
        self.0.values().any(|value| value.as_str() == Some(id))
    }

    /// Rewrites every top-level string value equal to `from`. Returns whether anything changed.
    pub fn replace_references(&mut self, from: &str, to: &str) -> bool {
        let mut changed = false;
        for value in self.0.values_mut() {
            if value.as_str() == Some(from) {
                *value = Value::String(to.to_string());
                changed = true;
            }
        }
        changed
    }
}
