use axum::Json;
use axum::extract::State;

use crate::error::AppResult;
use crate::graph::{GraphData, GraphExport, export_graph};
use crate::routes::AppState;

pub async fn visualize(
    State(state): State<AppState>,
    Json(data): Json<GraphData>,
) -> AppResult<Json<GraphExport>> {
    let export = export_graph(&data, &state.config.evidence_dir).await?;
    Ok(Json(export))
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::routes::{router, test_support};

    async fn post(app: axum::Router, payload: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post("/api/visualize")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_visualize_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_support::state(dir.path(), "http://127.0.0.1:9"));

        let (status, body) = post(
            app,
            json!({
                "case_name": "Nightjar",
                "case_id": "c-1",
                "entities": [{"id": "e1", "type": "domain", "value": "nightjar.example"}],
                "relationships": []
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let path = dir.path().join("c-1").join("graph.json");
        assert_eq!(body["file_path"], path.display().to_string());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_visualize_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_support::state(dir.path(), "http://127.0.0.1:9"));

        let (status, body) = post(app, json!({"case_id": "../../etc"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid case id"));
    }
}
