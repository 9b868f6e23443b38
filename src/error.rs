use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Failure of a single backend attempt. Every variant is retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("backend returned status {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("unrecognized response shape: {0}")]
    Shape(String),

    #[error("no valid JSON found in backend response: {0}")]
    Extraction(String),
}

impl AttemptError {
    pub fn transport(err: &reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    /// Low-cardinality label for the `error.type` span field and metric attribute.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Transport { timed_out: true, .. } => "timeout",
            Self::Transport { .. } => "network_error",
            Self::Protocol { status: 429, .. } => "rate_limit",
            Self::Protocol {
                status: 401 | 403, ..
            } => "auth_error",
            Self::Protocol { status, .. } if *status >= 500 => "server_error",
            Self::Protocol { .. } => "invalid_request",
            Self::Shape(_) => "shape_error",
            Self::Extraction(_) => "extraction_error",
        }
    }
}

/// Terminal outcome of a synthesis call that did not produce a report.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("LLM analysis failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptError },

    #[error("LLM analysis failed: deadline of {deadline_secs}s exceeded after {attempts} attempts: {last}")]
    DeadlineExceeded {
        deadline_secs: u64,
        attempts: u32,
        last: String,
    },

    #[error("LLM analysis failed: could not build HTTP client: {0}")]
    Client(String),
}

impl SynthesisError {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::DeadlineExceeded { attempts, .. } => *attempts,
            Self::Client(_) => 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid case id {0:?}")]
    InvalidCaseId(String),

    #[error("failed to write graph artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize graph: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::InvalidCaseId(_) => AppError::Validation(err.to_string()),
            other => AppError::Visualization(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Synthesis(_) => StatusCode::BAD_GATEWAY,
            AppError::Visualization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Synthesis(err) => {
                tracing::error!(error = %err, attempts = err.attempts(), "Synthesis error");
                err.to_string()
            }
            AppError::Visualization(msg) => {
                tracing::error!(error = %msg, "Visualization error");
                msg.clone()
            }
        };

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
