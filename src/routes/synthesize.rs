use axum::Json;
use axum::extract::State;
use serde_json::Value;

use crate::error::AppResult;
use crate::routes::AppState;
use crate::synthesis::CaseInput;

pub async fn synthesize(
    State(state): State<AppState>,
    Json(input): Json<CaseInput>,
) -> AppResult<Json<Value>> {
    let report = state.client.synthesize(&input).await?;
    Ok(Json(report.into_value()))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::routes::{router, test_support};

    #[tokio::test]
    async fn test_unreachable_backend_returns_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/api/generate", listener.local_addr().unwrap());
        drop(listener);
        let app = router(test_support::state(dir.path(), &endpoint));

        let response = app
            .oneshot(
                Request::post("/api/synthesize")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        json!({"case_name": "c", "context": "x"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(body["status"], 502);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("failed after 1 attempts")
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_support::state(dir.path(), "http://127.0.0.1:9/api/generate"));

        let response = app
            .oneshot(
                Request::post("/api/synthesize")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
