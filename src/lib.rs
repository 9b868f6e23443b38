//! SPECTRE case analyzer.
//!
//! Turns free-text case data into a structured intelligence report by asking
//! a text-generation backend, retrying transient failures and digging the JSON
//! report out of whatever prose the model wraps around it.

pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod routes;
pub mod synthesis;
pub mod telemetry;

pub use config::{Config, SynthesisPolicy};
pub use error::{AppError, AttemptError, GraphError, SynthesisError};
pub use llm::SynthesisClient;
pub use synthesis::{CaseInput, ProviderConfig, SynthesisReport};
