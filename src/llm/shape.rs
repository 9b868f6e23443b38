use serde_json::Value;

use crate::error::AttemptError;

use super::extract::truncate;

/// Known backend response families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"response": "..."}`, e.g. Ollama `/api/generate`.
    Generate,
    /// `{"choices": [{"message": {"content": "..."}}]}`, OpenAI-compatible chat.
    Chat,
}

impl ResponseShape {
    /// Detection order: a non-empty `response` wins over `choices`.
    pub const ALL: [ResponseShape; 2] = [ResponseShape::Generate, ResponseShape::Chat];

    pub fn name(self) -> &'static str {
        match self {
            ResponseShape::Generate => "generate",
            ResponseShape::Chat => "chat",
        }
    }

    /// Text carried by this shape, if the body has it.
    pub fn raw_text(self, body: &Value) -> Option<&str> {
        match self {
            ResponseShape::Generate => body
                .get("response")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty()),
            ResponseShape::Chat => body
                .get("choices")
                .and_then(Value::as_array)?
                .first()?
                .pointer("/message/content")
                .and_then(Value::as_str),
        }
    }
}

/// Reduces a backend body to its shape and the free-form text it carries.
pub fn normalize(body: &Value) -> Result<(ResponseShape, &str), AttemptError> {
    ResponseShape::ALL
        .into_iter()
        .find_map(|shape| shape.raw_text(body).map(|text| (shape, text)))
        .ok_or_else(|| AttemptError::Shape(truncate(&body.to_string(), 200)))
}
