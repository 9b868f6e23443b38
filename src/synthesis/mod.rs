pub mod input;
pub mod prompt;
pub mod report;

use serde_json::{Value, json};

use crate::error::SynthesisError;

pub use input::{CaseInput, ProviderConfig};
pub use report::SynthesisReport;

/// Outbound JSON for a finished call: the report itself, or `{"error": message}`.
pub fn outcome_json(result: Result<SynthesisReport, SynthesisError>) -> Value {
    match result {
        Ok(report) => report.into_value(),
        Err(err) => json!({ "error": err.to_string() }),
    }
}
