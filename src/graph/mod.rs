//! Case graph export.
//!
//! Turns entity/relationship records into a node-link document that a graph
//! front-end can lay out and render. Layout and styling beyond node colors are
//! left to the renderer.

pub mod artifact;
pub mod palette;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use artifact::{GraphExport, export_graph};
pub use palette::entity_color;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default = "default_case_name")]
    pub case_name: String,
    #[serde(default = "default_case_id")]
    pub case_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entities: Vec<Entity>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type", default = "default_entity_type")]
    pub kind: String,
    #[serde(default = "default_entity_value")]
    pub value: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from_entity_id: String,
    pub to_entity_id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl Relationship {
    /// Hover text; untyped edges read as `linked_to`.
    pub fn title(&self) -> &str {
        self.kind.as_deref().unwrap_or("linked_to")
    }

    /// Edge caption; untyped edges stay blank.
    pub fn label(&self) -> &str {
        self.kind.as_deref().unwrap_or("")
    }
}

impl Entity {
    /// Display label: the value, tagged with the country when known.
    pub fn label(&self) -> String {
        match self.meta("country") {
            Some(country) => format!("{} [{country}]", self.value),
            None => self.value.clone(),
        }
    }

    pub fn tooltip(&self) -> String {
        let mut tooltip = format!(
            "Type: {}\nSource: {}",
            self.kind,
            self.source.as_deref().unwrap_or("None")
        );
        if let Some(city) = self.meta("city") {
            let country = self.meta("country").unwrap_or_default();
            tooltip.push_str(&format!("\nLocation: {city}, {country}"));
        }
        if let Some(isp) = self.meta("isp") {
            tooltip.push_str(&format!("\nISP: {isp}"));
        }
        tooltip
    }

    /// Metadata value as display text; non-strings use their JSON form.
    fn meta(&self, key: &str) -> Option<String> {
        self.metadata.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn default_case_name() -> String {
    "Investigation".to_string()
}

fn default_case_id() -> String {
    "unknown".to_string()
}

fn default_entity_type() -> String {
    "unknown".to_string()
}

fn default_entity_value() -> String {
    "Unknown".to_string()
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
