//! Code execution endpoints.
//!
//! - `GET  /api/code/languages` lists the runtimes the execution service supports
//! - `POST /api/code/execute` runs a submission and returns the classified outcome
//!
//! Logical failures of the submitted program (compile errors, crashes, kills,
//! remote rejections) are 200 responses with `success: false`. Only problems
//! with the request itself or with reaching the service are HTTP errors.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use codelab_executor::{NormalizedOutcome, RuntimeDescriptor, Submission};
use tracing::debug;

use crate::auth::Identity;
use crate::error::ServerError;
use crate::state::AppState;

/// GET /api/code/languages - Supported runtimes.
///
/// Served from the runtime cache; a failed refresh is a 500.
pub async fn languages_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<RuntimeDescriptor>>, ServerError> {
    let runtimes = state
        .runner
        .languages()
        .await
        .map_err(|e| ServerError::Upstream(e.to_string()))?;

    Ok(Json(runtimes.as_ref().clone()))
}

/// POST /api/code/execute - Run a submission.
pub async fn execute_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<NormalizedOutcome>, ServerError> {
    let Json(submission) = payload.map_err(reject_payload)?;

    debug!(
        ?identity,
        language = %submission.language,
        files = submission.files.len(),
        bytes = submission.source_bytes(),
        "Execute request"
    );

    let budget = state.config.execution_timeout;
    let classification = tokio::time::timeout(budget, state.runner.run(submission))
        .await
        .map_err(|_| {
            ServerError::ExecutionTimeout(format!(
                "Code execution took too long (exceeded {} seconds)",
                budget.as_secs_f64()
            ))
        })??;

    Ok(Json(classification.outcome))
}

fn reject_payload(rejection: JsonRejection) -> ServerError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ServerError::PayloadTooLarge(rejection.body_text());
    }
    ServerError::BadRequest(format!("Invalid payload: {}", rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use codelab_executor::{
        CodeRunner, ExecutionResult, ExecutorError, MockBackend, Signal, StageResult,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{Server, ServerConfig};

    const TOKEN: &str = "test-token";

    fn app(backend: &Arc<MockBackend>, config: ServerConfig) -> Router {
        let runner = CodeRunner::new(backend.clone());
        Server::new(runner, config.with_request_logging(false)).router()
    }

    fn authed() -> ServerConfig {
        ServerConfig::new(Some(TOKEN.to_string()))
    }

    fn execute(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/code/execute")
            .header(CONTENT_TYPE, "application/json")
            .header("Authorization", format!("Bearer {TOKEN}"))
            .body(body.into())
            .unwrap()
    }

    fn hello(language: &str) -> String {
        json!({
            "language": language,
            "version": "*",
            "files": [{"name": "main", "content": "print(42)"}],
            "stdin": ""
        })
        .to_string()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_execute_success() {
        let backend = Arc::new(MockBackend::with_stdout("42\n"));
        let response = app(&backend, authed())
            .oneshot(execute(hello("python")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["output"], "42\n");
        assert_eq!(body["error"], Value::Null);
        assert_eq!(body["raw"]["run"]["stdout"], "42\n");

        assert_eq!(backend.requests()[0].language, "python3");
    }

    #[tokio::test]
    async fn test_oversized_code_rejected_without_dispatch() {
        let backend = Arc::new(MockBackend::with_stdout("unused"));
        let payload = json!({
            "language": "python",
            "files": [
                {"content": "a".repeat(30 * 1024)},
                {"content": "b".repeat(30 * 1024)}
            ]
        })
        .to_string();

        let response = app(&backend, authed())
            .oneshot(execute(payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("Code too large"));
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_files_is_bad_request() {
        let backend = Arc::new(MockBackend::with_stdout("unused"));
        let response = app(&backend, authed())
            .oneshot(execute(r#"{"language": "python"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "bad_request");
        assert!(body["message"].as_str().unwrap().contains("Invalid payload"));
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let backend = Arc::new(MockBackend::with_stdout("unused"));
        let payload = json!({
            "language": "python",
            "files": [{"content": "x".repeat(200 * 1024)}]
        })
        .to_string();

        let response = app(&backend, authed())
            .oneshot(execute(payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_execute_never_dispatched() {
        let backend = Arc::new(MockBackend::with_stdout("unused"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/code/execute")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(hello("python")))
            .unwrap();

        let response = app(&backend, authed()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_local_timeout_is_504() {
        let backend = Arc::new(MockBackend::with_stdout("late").with_delay(Duration::from_millis(500)));
        let config = authed().with_execution_timeout(Duration::from_millis(50));

        let response = app(&backend, config)
            .oneshot(execute(hello("python")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Execution Timeout");
    }

    #[tokio::test]
    async fn test_client_timeout_is_504() {
        let backend = Arc::new(
            MockBackend::new().push_result(Err(ExecutorError::Timeout("20s".to_string()))),
        );
        let response = app(&backend, authed())
            .oneshot(execute(hello("java")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_json(response).await["error"], "Execution Timeout");
    }

    #[tokio::test]
    async fn test_remote_kill_is_200_timeout_outcome() {
        let backend = Arc::new(MockBackend::new().push_result(Ok(ExecutionResult {
            run: Some(StageResult {
                stdout: "tick".to_string(),
                signal: Some(Signal::Number(9)),
                ..Default::default()
            }),
            ..Default::default()
        })));

        let response = app(&backend, authed())
            .oneshot(execute(hello("python")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Timeout or Infinite Loop Detected");
        assert_eq!(body["output"], "tick\n[Process killed due to timeout]");
    }

    #[tokio::test]
    async fn test_remote_rejection_surfaces_message() {
        let backend = Arc::new(MockBackend::new().push_result(Ok(ExecutionResult::remote_error(
            json!({"message": "cobol-* runtime is unknown"}),
        ))));

        let response = app(&backend, authed())
            .oneshot(execute(hello("cobol")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "cobol-* runtime is unknown");
        assert_eq!(body["output"], "");
        assert_eq!(body["raw"]["message"], "cobol-* runtime is unknown");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_500() {
        let backend = Arc::new(
            MockBackend::new().push_result(Err(ExecutorError::Network("refused".to_string()))),
        );
        let response = app(&backend, authed())
            .oneshot(execute(hello("go")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["message"].is_string());
    }

    #[tokio::test]
    async fn test_languages_unauthenticated_and_cached() {
        let backend = Arc::new(MockBackend::new().push_runtimes(Ok(vec![
            codelab_executor::RuntimeDescriptor::new("python", "3.10.0", ["py", "python3"]),
        ])));
        let app = app(&backend, authed());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/code/languages")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = body_json(response).await;
            assert_eq!(
                body,
                json!([{"language": "python", "version": "3.10.0", "aliases": ["py", "python3"]}])
            );
        }

        assert_eq!(backend.runtime_calls(), 1);
    }

    #[tokio::test]
    async fn test_languages_failure_is_500() {
        let backend = Arc::new(
            MockBackend::new().push_runtimes(Err(ExecutorError::Timeout("15s".to_string()))),
        );
        let response = app(&backend, authed())
            .oneshot(
                Request::builder()
                    .uri("/api/code/languages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
