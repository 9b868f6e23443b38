use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::synthesis::prompt::SYSTEM_PROMPT;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "llama3";

/// Upper bound for `SPECTRE_LLM_DEADLINE_SECS`: one day.
pub const MAX_DEADLINE_SECS: u64 = 86_400;

/// Per-client synthesis policy. Each `SynthesisClient` owns one, so clients
/// with different policies can run side by side.
#[derive(Debug, Clone)]
pub struct SynthesisPolicy {
    pub system_prompt: String,
    pub default_endpoint: String,
    pub default_timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Bound on the whole retry sequence, backoff sleeps included. `None` disables it.
    pub deadline: Option<Duration>,
}

impl Default for SynthesisPolicy {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            default_endpoint: DEFAULT_ENDPOINT.to_string(),
            default_timeout: Duration::from_secs(120),
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            deadline: Some(Duration::from_secs(180)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub evidence_dir: PathBuf,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: Option<String>,
    pub policy: SynthesisPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = SynthesisPolicy::default();

        let deadline_secs: u64 = parse_var(&lookup, "SPECTRE_LLM_DEADLINE_SECS", 180)?;
        anyhow::ensure!(
            deadline_secs <= MAX_DEADLINE_SECS,
            "SPECTRE_LLM_DEADLINE_SECS must be at most {MAX_DEADLINE_SECS}, got {deadline_secs}"
        );
        let policy = SynthesisPolicy {
            default_endpoint: lookup("SPECTRE_LLM_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.default_endpoint),
            default_timeout: Duration::from_secs(
                parse_var(&lookup, "SPECTRE_LLM_TIMEOUT_SECS", 120u64)?.max(1),
            ),
            max_attempts: parse_var(&lookup, "SPECTRE_LLM_MAX_ATTEMPTS", 3u32)?.max(1),
            backoff: Duration::from_millis(parse_var(&lookup, "SPECTRE_LLM_BACKOFF_MS", 1000u64)?),
            deadline: (deadline_secs > 0).then(|| Duration::from_secs(deadline_secs)),
            ..defaults
        };

        Ok(Self {
            port: parse_var(&lookup, "APP_PORT", 8080)?,
            environment: lookup("SPECTRE_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
            evidence_dir: lookup("SPECTRE_EVIDENCE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("evidence_storage")),
            otel_service_name: lookup("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| "spectre-analyzer".to_string()),
            otel_exporter_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|endpoint| !endpoint.is_empty()),
            policy,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}
