use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{DEFAULT_MODEL, SynthesisPolicy};

/// Inbound case payload, as sent by the case engine. Unknown fields such as
/// `task`, `case_id` or `data` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseInput {
    #[serde(default = "default_case_name")]
    pub case_name: String,
    #[serde(default)]
    pub context: String,
    #[serde(default = "default_model", deserialize_with = "non_empty_or_default_model")]
    pub model: String,
    #[serde(default, rename = "llm_config")]
    pub provider_config: ProviderConfig,
}

/// Provider settings supplied by the caller. Empty strings and a zero timeout
/// mean "not configured" and fall back to the client's policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, rename = "url", deserialize_with = "empty_as_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub api_key: Option<String>,
    #[serde(default, rename = "timeout")]
    pub timeout_seconds: u64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub provider: Option<String>,
}

impl ProviderConfig {
    pub fn endpoint<'a>(&'a self, policy: &'a SynthesisPolicy) -> &'a str {
        self.endpoint_url
            .as_deref()
            .unwrap_or(&policy.default_endpoint)
    }

    pub fn timeout(&self, policy: &SynthesisPolicy) -> Duration {
        if self.timeout_seconds > 0 {
            Duration::from_secs(self.timeout_seconds)
        } else {
            policy.default_timeout
        }
    }
}

impl CaseInput {
    pub fn new(case_name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            case_name: case_name.into(),
            context: context.into(),
            model: default_model(),
            provider_config: ProviderConfig::default(),
        }
    }
}

fn default_case_name() -> String {
    "Unknown".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn non_empty_or_default_model<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(empty_as_none(deserializer)?.unwrap_or_else(default_model))
}
