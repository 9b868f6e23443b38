use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::AttemptError;

use super::extract::truncate;
use super::{Backend, SynthesisRequest, Target};

/// JSON-over-HTTP backend. One `reqwest::Client` is shared across attempts
/// so connections are reused.
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("spectre-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn headers(req: &SynthesisRequest) -> Result<HeaderMap, AttemptError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = &req.auth_header {
            let value = HeaderValue::from_str(auth).map_err(|e| AttemptError::Transport {
                message: format!("invalid API key header: {e}"),
                timed_out: false,
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn submit(&self, req: &SynthesisRequest, target: &Target) -> Result<Value, AttemptError> {
        let response = self
            .client
            .post(&target.endpoint)
            .headers(Self::headers(req)?)
            .timeout(target.timeout)
            .json(req)
            .send()
            .await
            .map_err(|e| AttemptError::transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::transport(&e))?;

        if !status.is_success() {
            return Err(AttemptError::Protocol {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            AttemptError::Shape(format!("body is not JSON ({e}): {}", truncate(&body, 200)))
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
