use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use donafeed_core::processors::{IngestError, WebhookBatch};
use donafeed_sdk::objects::WebhookErrorBody;
use kanau::processor::Processor;
use serde_json::Value;

use crate::state::AppState;

/// `POST /webhook`: ingest a batch of raw events.
///
/// Responds `200` when every element was accepted, `207 Multi-Status` when
/// some were skipped, and `400` when the batch itself is rejected. A body
/// that is not JSON at all is treated like any other malformed batch.
pub(super) async fn receive_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, WebhookRejection> {
    let (batch, detail) = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => (value, None),
        Err(e) => {
            tracing::debug!(error = %e, "Webhook body is not valid JSON");
            (Value::Null, Some(e.to_string()))
        }
    };

    let response = state
        .ingestor
        .process(WebhookBatch(batch))
        .await
        .map_err(|error| WebhookRejection { error, detail })?;

    let status = if response.errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(response)).into_response())
}

/// A batch rejected as a whole.
#[derive(Debug)]
pub(super) struct WebhookRejection {
    error: IngestError,
    detail: Option<String>,
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        let body = WebhookErrorBody {
            message: self.error.to_string(),
            error: self.detail,
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::test_state;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use donafeed_sdk::objects::{WebhookErrorBody, WebhookResponse};
    use serde_json::json;
    use tower::ServiceExt;

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn donate(amount: &str) -> serde_json::Value {
        json!({
            "parsedData": {"type": "DONATE", "data": {"amount": amount}},
            "accounts": {"campaign": "C1", "donor": "U1"}
        })
    }

    #[tokio::test]
    async fn test_accepted_batch_returns_ok() {
        let state = test_state();
        let router = build_router(state.clone());

        let batch = json!([donate("10"), donate("20")]).to_string();
        let response = router.oneshot(post(batch)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: WebhookResponse = read_json(response).await;
        assert_eq!(body.events_processed, 2);
        assert!(body.errors.is_empty());
        assert_eq!(state.buffer.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_batch_returns_multi_status() {
        let router = build_router(test_state());

        let batch = json!([donate("10"), {"parsedData": {"type": "NOPE", "data": {}}}]).to_string();
        let response = router.oneshot(post(batch)).await.unwrap();
        assert_eq!(response.status(), StatusCode::MULTI_STATUS);

        let body: WebhookResponse = read_json(response).await;
        assert_eq!(body.skipped_events, 1);
        assert_eq!(body.errors[0].index, 1);
    }

    #[tokio::test]
    async fn test_non_array_returns_bad_request() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(post(json!({"parsedData": {}}).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: WebhookErrorBody = read_json(response).await;
        assert_eq!(body.message, "Invalid data format");
        assert!(body.error.is_none());
        assert!(state.buffer.snapshot().error().is_some());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_bad_request() {
        let router = build_router(test_state());

        let response = router.oneshot(post("[{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: WebhookErrorBody = read_json(response).await;
        assert_eq!(body.message, "Invalid data format");
        assert!(body.error.is_some());
    }

    #[tokio::test]
    async fn test_oversized_batch_returns_bad_request() {
        let state = test_state();
        state
            .config
            .ingest
            .update(donafeed_core::config::IngestConfig { max_batch_size: 1 });
        let router = build_router(state);

        let batch = json!([donate("1"), donate("2")]).to_string();
        let response = router.oneshot(post(batch)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: WebhookErrorBody = read_json(response).await;
        assert_eq!(body.message, "Maximum batch size is 1 events");
    }
}
