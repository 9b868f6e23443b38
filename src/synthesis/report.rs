use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured intelligence report as returned by the backend.
///
/// The object is kept exactly as parsed: unknown keys survive and missing
/// keys stay missing. Accessors read the well-known keys leniently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynthesisReport(Map<String, Value>);

impl SynthesisReport {
    pub fn findings(&self) -> Vec<&str> {
        self.strings("findings")
    }

    pub fn risks(&self) -> Vec<&str> {
        self.strings("risks")
    }

    pub fn connections(&self) -> Vec<&str> {
        self.strings("connections")
    }

    pub fn next_steps(&self) -> Vec<&str> {
        self.strings("next_steps")
    }

    /// Confidence as reported, without clamping to `[0, 1]`.
    pub fn confidence(&self) -> Option<f64> {
        self.0.get("confidence").and_then(Value::as_f64)
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

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn strings(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) => vec![single.as_str()],
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for SynthesisReport {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
