use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use tracing::{error, warn};

use gchat_core::{Relay, RelayError};
use gchat_protocol::chat::ErrorBody;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const PANIC_MESSAGE: &str = "Uncaught exception on the server. See logs.";
const STREAM_FAILURE: &str = "Failed to process chat request";

#[derive(Clone)]
pub struct ChatState {
    pub relay: Relay,
}

#[derive(Clone)]
struct RequestTraceId(String);

pub fn chat_router(relay: Relay) -> Router {
    let state = ChatState { relay };

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .layer(middleware::from_fn(assign_trace_id))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn assign_trace_id(mut req: axum::http::Request<Body>, next: Next) -> Response {
    let trace_id = uuid::Uuid::now_v7().to_string();
    req.extensions_mut().insert(RequestTraceId(trace_id));
    next.run(req).await
}

async fn healthz() -> &'static str {
    "ok"
}

async fn chat(
    State(state): State<ChatState>,
    Extension(RequestTraceId(trace_id)): Extension<RequestTraceId>,
    body: Bytes,
) -> Response {
    match guarded(&trace_id, state.relay.generate(&trace_id, &body)).await {
        Ok(reply) => json_response(StatusCode::OK, &reply),
        Err(err) => {
            log_failure(&trace_id, "generate_content", &err);
            json_response(err.status(), &ErrorBody::new(err.to_string()))
        }
    }
}

async fn chat_stream(
    State(state): State<ChatState>,
    Extension(RequestTraceId(trace_id)): Extension<RequestTraceId>,
    body: Bytes,
) -> Response {
    let frames = match guarded(&trace_id, state.relay.stream(&trace_id, &body)).await {
        Ok(frames) => frames,
        Err(err) => {
            log_failure(&trace_id, "stream_generate_content", &err);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorBody::with_details(STREAM_FAILURE, err.to_string()),
            );
        }
    };

    let mut resp = Body::from_stream(frames.map(Ok::<_, Infallible>)).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    resp
}

/// Turns a panic inside the relay into an ordinary internal error.
async fn guarded<T, F>(trace_id: &str, fut: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_default();
            error!(event = "relay_panicked", trace_id = %trace_id, panic = %detail);
            Err(RelayError::Internal(PANIC_MESSAGE.to_string()))
        }
    }
}

fn log_failure(trace_id: &str, op: &str, err: &RelayError) {
    warn!(
        event = "relay_failed",
        trace_id = %trace_id,
        op = %op,
        status = err.status().as_u16(),
        error = %err
    );
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let body = match serde_json::to_vec(body) {
        Ok(body) => body,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response();
        }
    };
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(body))
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response()
        })
}
