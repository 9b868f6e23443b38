pub mod client;
pub mod extract;
pub mod http;
pub mod shape;

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::AttemptError;

pub use client::SynthesisClient;
pub use http::HttpBackend;
pub use shape::ResponseShape;

/// Body posted to the backend. `auth_header` travels as a header, never in the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip)]
    pub auth_header: Option<String>,
}

/// Where and how long a single attempt may talk to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub endpoint: String,
    pub timeout: Duration,
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Performs one request and returns the decoded JSON body of a 2xx response.
    async fn submit(&self, req: &SynthesisRequest, target: &Target) -> Result<Value, AttemptError>;
    fn name(&self) -> &str;
}
