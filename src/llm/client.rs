use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::extract::{extract_report, truncate};
use super::shape::normalize;
use super::{Backend, HttpBackend, SynthesisRequest, Target};
use crate::config::SynthesisPolicy;
use crate::error::{AttemptError, SynthesisError};
use crate::synthesis::prompt::build_prompt;
use crate::synthesis::{CaseInput, SynthesisReport};
use crate::telemetry::metrics::{
    GEN_AI_ERROR_COUNT, GEN_AI_OPERATION_DURATION, GEN_AI_RETRY_COUNT, SYNTHESIS_DURATION,
    SYNTHESIS_OUTCOMES,
};

/// Report synthesis client.
///
/// Holds no per-call state; share it behind an `Arc` between concurrent callers.
pub struct SynthesisClient {
    backend: Arc<dyn Backend>,
    policy: SynthesisPolicy,
}

impl SynthesisClient {
    pub fn new(policy: SynthesisPolicy) -> Result<Self, SynthesisError> {
        let backend = HttpBackend::new().map_err(|e| SynthesisError::Client(e.to_string()))?;
        Ok(Self::with_backend(Arc::new(backend), policy))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, policy: SynthesisPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &SynthesisPolicy {
        &self.policy
    }

    pub fn build_request(&self, input: &CaseInput) -> SynthesisRequest {
        SynthesisRequest {
            model: input.model.clone(),
            prompt: build_prompt(&self.policy.system_prompt, &input.context),
            stream: false,
            auth_header: input
                .provider_config
                .api_key
                .as_ref()
                .map(|key| format!("Bearer {key}")),
        }
    }

    pub fn target(&self, input: &CaseInput) -> Target {
        Target {
            endpoint: input.provider_config.endpoint(&self.policy).to_string(),
            timeout: input.provider_config.timeout(&self.policy),
        }
    }

    #[tracing::instrument(
        name = "synthesis",
        skip(self, input),
        fields(
            case.name = %input.case_name,
            gen_ai.request.model = %input.model,
            gen_ai.provider.name = input.provider_config.provider.as_deref().unwrap_or(self.backend.name()),
            synthesis.attempts,
            synthesis.outcome,
        )
    )]
    pub async fn synthesize(&self, input: &CaseInput) -> Result<SynthesisReport, SynthesisError> {
        let start = Instant::now();
        let req = self.build_request(input);
        let target = self.target(input);

        let result = self.generate_with_retry(&req, &target).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(SynthesisError::DeadlineExceeded { .. }) => "deadline_exceeded",
            Err(_) => "exhausted",
        };
        tracing::Span::current().record("synthesis.outcome", outcome);

        let outcome_kv = KeyValue::new("synthesis.outcome", outcome);
        SYNTHESIS_DURATION.record(start.elapsed().as_secs_f64(), &[outcome_kv.clone()]);
        SYNTHESIS_OUTCOMES.add(1, &[outcome_kv]);

        match &result {
            Ok(report) => tracing::info!(
                case = %input.case_name,
                findings = report.findings().len(),
                confidence = report.confidence(),
                "Case synthesis complete"
            ),
            Err(err) => tracing::error!(
                case = %input.case_name,
                attempts = err.attempts(),
                error = %err,
                "Case synthesis failed"
            ),
        }

        result
    }

    async fn generate_once(
        &self,
        req: &SynthesisRequest,
        target: &Target,
        attempt: u32,
    ) -> Result<SynthesisReport, AttemptError> {
        let start = Instant::now();

        let span = tracing::info_span!(
            "gen_ai.generate",
            otel.name = %format!("gen_ai.generate {}", req.model),
            gen_ai.operation.name = "generate",
            gen_ai.request.model = %req.model,
            server.address = %target.endpoint,
            synthesis.attempt = attempt,
            gen_ai.response.shape = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );
        span.add_event(
            "gen_ai.user.message",
            vec![KeyValue::new("gen_ai.prompt", truncate(&req.prompt, 1000))],
        );

        let result = async {
            let body = self.backend.submit(req, target).await?;
            let (shape, raw_text) = normalize(&body)?;
            tracing::Span::current().record("gen_ai.response.shape", shape.name());
            extract_report(raw_text)
        }
        .instrument(span.clone())
        .await;

        let model_kv = KeyValue::new("gen_ai.request.model", req.model.clone());
        GEN_AI_OPERATION_DURATION.record(
            start.elapsed().as_secs_f64(),
            &[KeyValue::new("gen_ai.operation.name", "generate"), model_kv.clone()],
        );

        if let Err(err) = &result {
            span.record("otel.status_code", "ERROR");
            span.record("error.type", err.error_type());
            GEN_AI_ERROR_COUNT.add(1, &[KeyValue::new("error.type", err.error_type()), model_kv]);
        }

        result
    }

    async fn generate_with_retry(
        &self,
        req: &SynthesisRequest,
        target: &Target,
    ) -> Result<SynthesisReport, SynthesisError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let deadline = self
            .policy
            .deadline
            .and_then(|limit| tokio::time::Instant::now().checked_add(limit));
        let mut last_err: Option<AttemptError> = None;

        for attempt in 1..=max_attempts {
            tracing::Span::current().record("synthesis.attempts", attempt);

            let outcome = match deadline {
                Some(at) => {
                    match tokio::time::timeout_at(at, self.generate_once(req, target, attempt)).await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => return Err(self.deadline_exceeded(attempt, last_err)),
                    }
                }
                None => self.generate_once(req, target, attempt).await,
            };

            let err = match outcome {
                Ok(report) => return Ok(report),
                Err(err) => err,
            };

            tracing::warn!(
                attempt,
                max_attempts,
                model = %req.model,
                error.type = err.error_type(),
                error = %err,
                "LLM call failed"
            );

            if attempt < max_attempts {
                if let Some(at) = deadline
                    && tokio::time::Instant::now()
                        .checked_add(self.policy.backoff)
                        .is_none_or(|resume| resume >= at)
                {
                    return Err(self.deadline_exceeded(attempt, Some(err)));
                }

                GEN_AI_RETRY_COUNT.add(1, &[KeyValue::new("gen_ai.request.model", req.model.clone())]);
                tokio::time::sleep(self.policy.backoff).await;
            }

            last_err = Some(err);
        }

        Err(match last_err {
            Some(last) => SynthesisError::Exhausted {
                attempts: max_attempts,
                last,
            },
            None => SynthesisError::Exhausted {
                attempts: max_attempts,
                last: AttemptError::Extraction("no attempt was made".to_string()),
            },
        })
    }

    fn deadline_exceeded(&self, attempts: u32, last: Option<AttemptError>) -> SynthesisError {
        SynthesisError::DeadlineExceeded {
            deadline_secs: self.policy.deadline.map(|d| d.as_secs()).unwrap_or_default(),
            attempts,
            last: last
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no attempt completed".to_string()),
        }
    }
}
