pub mod health;
pub mod synthesize;
pub mod visualize;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response, StatusCode};
use axum::routing::{get, post};
use opentelemetry::KeyValue;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::config::Config;
use crate::llm::SynthesisClient;
use crate::telemetry::{HTTP_REQUEST_DURATION, HTTP_REQUESTS_TOTAL};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub client: Arc<SynthesisClient>,
}

#[derive(Clone)]
struct HttpMakeSpan;

impl<B> MakeSpan<B> for HttpMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let path = request.uri().path();

        tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{} {}", method, path),
            http.method = %method,
            http.route = %path,
            http.target = %request.uri(),
            http.scheme = "http",
            http.flavor = ?request.version(),
            http.user_agent = request.headers()
                .get("user-agent")
                .and_then(|v| v.to_str().ok())
                .unwrap_or(""),
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        )
    }
}

#[derive(Clone)]
struct HttpOnResponse;

impl<B> OnResponse<B> for HttpOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();

        span.record("http.response.status_code", status as i64);

        if status >= 500 {
            span.record("otel.status_code", "ERROR");
        } else {
            span.record("otel.status_code", "OK");
        }

        let latency_ms = latency.as_secs_f64() * 1000.0;
        let attrs = [
            KeyValue::new("http.status_code", status.to_string()),
            KeyValue::new("http.status_class", format!("{}xx", status / 100)),
        ];

        HTTP_REQUESTS_TOTAL.add(1, &attrs);
        HTTP_REQUEST_DURATION.record(latency_ms, &attrs);

        tracing::info!(
            http.response.status_code = status,
            latency_ms = latency_ms,
            "finished processing request"
        );
    }
}

/// Request timeout: the synthesis deadline plus headroom, or five minutes when
/// no deadline is configured.
fn request_timeout(config: &Config) -> Duration {
    config
        .policy
        .deadline
        .and_then(|deadline| deadline.checked_add(Duration::from_secs(10)))
        .unwrap_or(Duration::from_secs(300))
}

pub fn router(state: AppState) -> Router {
    let timeout = request_timeout(&state.config);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/synthesize", post(synthesize::synthesize))
        .route("/api/visualize", post(visualize::visualize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(HttpMakeSpan)
                .on_response(HttpOnResponse),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use super::*;
    use crate::config::SynthesisPolicy;

    pub fn state(evidence_dir: &Path, endpoint: &str) -> AppState {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.evidence_dir = evidence_dir.to_path_buf();
        config.policy = SynthesisPolicy {
            default_endpoint: endpoint.to_string(),
            max_attempts: 1,
            backoff: Duration::ZERO,
            ..SynthesisPolicy::default()
        };
        let client = SynthesisClient::new(config.policy.clone()).unwrap();
        AppState {
            config,
            client: Arc::new(client),
        }
    }
}
