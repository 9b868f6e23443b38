//! End-to-end synthesis against a mock text-generation backend.

use std::time::Duration;

use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spectre_analyzer::synthesis::outcome_json;
use spectre_analyzer::{AttemptError, CaseInput, SynthesisClient, SynthesisError, SynthesisPolicy};

const REPORT_TEXT: &str = "Sure! Here is the report: {\"findings\":[\"a\"],\"risks\":[],\"connections\":[],\"next_steps\":[],\"confidence\":0.5} Let me know if you need more.";

fn fast_client() -> SynthesisClient {
    let policy = SynthesisPolicy {
        backoff: Duration::from_millis(10),
        ..SynthesisPolicy::default()
    };
    SynthesisClient::new(policy).unwrap()
}

fn case_for(server: &MockServer, extra_config: Value) -> CaseInput {
    let mut llm_config = json!({
        "provider": "ollama",
        "url": format!("{}/api/generate", server.uri()),
    });
    if let (Some(base), Some(extra)) = (llm_config.as_object_mut(), extra_config.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(json!({
        "case_name": "Operation Nightjar",
        "context": "domain nightjar.example resolves to 203.0.113.7",
        "model": "llama3",
        "llm_config": llm_config,
    }))
    .unwrap()
}

fn generate_body(text: &str) -> Value {
    json!({"model": "llama3", "response": text, "done": true})
}

#[tokio::test]
async fn test_generate_style_success_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer sk-case"))
        .and(body_partial_json(json!({"model": "llama3", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(generate_body(REPORT_TEXT)))
        .expect(1)
        .mount(&server)
        .await;

    let case = case_for(&server, json!({"api_key": "sk-case"}));
    let report = assert_ok!(fast_client().synthesize(&case).await);

    assert_eq!(
        report.into_value(),
        json!({"findings":["a"],"risks":[],"connections":[],"next_steps":[],"confidence":0.5})
    );
}

#[tokio::test]
async fn test_request_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generate_body(REPORT_TEXT)))
        .mount(&server)
        .await;

    assert_ok!(fast_client().synthesize(&case_for(&server, json!({}))).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.headers.get("authorization").is_none());

    let body: Value = request.body_json().unwrap();
    assert_eq!(body["model"], "llama3");
    assert_eq!(body["stream"], false);
    assert_eq!(body.as_object().unwrap().len(), 3);
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.starts_with("You are SPECTRE"));
    assert!(prompt.ends_with("CASE DATA:\ndomain nightjar.example resolves to 203.0.113.7"));
}

#[tokio::test]
async fn test_chat_style_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"findings\":[]}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = assert_ok!(fast_client().synthesize(&case_for(&server, json!({}))).await);
    assert_eq!(report.into_value(), json!({"findings": []}));
}

#[tokio::test]
async fn test_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generate_body(REPORT_TEXT)))
        .expect(1)
        .mount(&server)
        .await;

    let report = assert_ok!(fast_client().synthesize(&case_for(&server, json!({}))).await);
    assert_eq!(report.findings(), vec!["a"]);
}

#[tokio::test]
async fn test_always_unparseable_exhausts_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(generate_body("I cannot help with that.")),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = assert_err!(fast_client().synthesize(&case_for(&server, json!({}))).await);
    match &err {
        SynthesisError::Exhausted { attempts, last } => {
            assert_eq!(*attempts, 3);
            assert!(matches!(last, AttemptError::Extraction(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let outcome = outcome_json(Err(err));
    let message = outcome["error"].as_str().unwrap();
    assert!(message.contains('3'));
    assert!(message.contains("I cannot help with that."));
}

#[tokio::test]
async fn test_non_json_body_is_a_shape_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let err = assert_err!(fast_client().synthesize(&case_for(&server, json!({}))).await);
    assert!(matches!(
        err,
        SynthesisError::Exhausted {
            last: AttemptError::Shape(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_per_attempt_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(generate_body(REPORT_TEXT))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let case = case_for(&server, json!({"timeout": 1}));
    let err = assert_err!(fast_client().synthesize(&case).await);

    match err {
        SynthesisError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.error_type(), "timeout");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_overall_deadline_bounds_the_retry_sequence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let policy = SynthesisPolicy {
        backoff: Duration::from_secs(2),
        deadline: Some(Duration::from_secs(1)),
        ..SynthesisPolicy::default()
    };
    let client = SynthesisClient::new(policy).unwrap();
    let err = assert_err!(client.synthesize(&case_for(&server, json!({}))).await);

    assert!(matches!(
        err,
        SynthesisError::DeadlineExceeded { attempts: 1, .. }
    ));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_reported() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api/generate", listener.local_addr().unwrap());
    drop(listener);

    let case: CaseInput = serde_json::from_value(json!({
        "context": "x",
        "llm_config": {"url": url}
    }))
    .unwrap();
    let err = assert_err!(fast_client().synthesize(&case).await);

    match err {
        SynthesisError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(last, AttemptError::Transport { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
