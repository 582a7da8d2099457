use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bytes::Bytes;
use serde_json::{Value, json};
use tower::ServiceExt;

use gchat_common::{Credential, GlobalConfig};
use gchat_core::{
    Relay, UpstreamBody, UpstreamClient, UpstreamFailure, UpstreamHttpRequest,
    UpstreamHttpResponse,
};
use gchat_router::chat_router;

/// Answers every call with the same canned response.
struct CannedUpstream {
    status: u16,
    body: UpstreamBodyKind,
    calls: Mutex<usize>,
}

enum UpstreamBodyKind {
    Json(&'static str),
    Sse(&'static [&'static str]),
    Panic,
}

impl CannedUpstream {
    fn new(status: u16, body: UpstreamBodyKind) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl UpstreamClient for CannedUpstream {
    fn send<'a>(
        &'a self,
        _req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        *self.calls.lock().unwrap() += 1;
        let body = match &self.body {
            UpstreamBodyKind::Json(text) => UpstreamBody::Bytes(Bytes::from_static(text.as_bytes())),
            UpstreamBodyKind::Sse(chunks) => {
                let chunks: Vec<Result<Bytes, UpstreamFailure>> = chunks
                    .iter()
                    .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                    .collect();
                UpstreamBody::Stream(Box::pin(futures_util::stream::iter(chunks)))
            }
            UpstreamBodyKind::Panic => panic!("upstream exploded"),
        };
        Box::pin(std::future::ready(Ok(UpstreamHttpResponse {
            status: self.status,
            body,
        })))
    }
}

fn app(upstream: &Arc<CannedUpstream>, credential: Credential) -> axum::Router {
    let config = GlobalConfig {
        credential,
        ..GlobalConfig::default()
    };
    chat_router(Relay::new(upstream.clone(), config))
}

fn key() -> Credential {
    Credential::ApiKey("k".to_string())
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Bytes {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

const CONVERSATION: &str = r#"{"messages":[{"id":"1","role":"user","content":"Hi"}]}"#;

#[tokio::test]
async fn chat_returns_assistant_reply_without_caching() {
    let upstream = CannedUpstream::new(
        200,
        UpstreamBodyKind::Json(r#"{"candidates":[{"content":{"parts":[{"text":"Hello!"}]}}]}"#),
    );
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    let body = body_json(resp).await;
    assert_eq!(body["role"], "assistant");
    assert_eq!(body["content"], "Hello!");
    assert!(body["id"].as_str().unwrap().parse::<u128>().is_ok());
}

#[tokio::test]
async fn chat_without_key_reports_configuration_error() {
    let upstream = CannedUpstream::new(200, UpstreamBodyKind::Json("{}"));
    let resp = app(&upstream, Credential::Missing)
        .oneshot(post("/api/chat", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Missing GOOGLE_GENERATIVE_AI_API_KEY.")
    );
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn chat_passes_upstream_status_through() {
    let upstream = CannedUpstream::new(
        404,
        UpstreamBodyKind::Json(r#"{"error":{"code":404,"message":"models/gemini-pro is not found"}}"#),
    );
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(resp).await,
        json!({ "error": "Gemini API error: models/gemini-pro is not found" })
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn chat_retries_once_on_forbidden() {
    let upstream = CannedUpstream::new(
        403,
        UpstreamBodyKind::Json(r#"{"error":{"code":403,"message":"denied"}}"#),
    );
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn chat_panic_becomes_internal_error() {
    let upstream = CannedUpstream::new(200, UpstreamBodyKind::Panic);
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({ "error": "Uncaught exception on the server. See logs." })
    );
}

#[tokio::test]
async fn stream_relays_frames_with_event_stream_headers() {
    let upstream = CannedUpstream::new(
        200,
        UpstreamBodyKind::Sse(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" there\"}]}}]}\n\n",
        ]),
    );
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat/stream", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(resp.headers()[header::CONNECTION], "keep-alive");
    assert_eq!(
        &body_bytes(resp).await[..],
        b"data: {\"content\":\"Hi\"}\n\ndata: {\"content\":\" there\"}\n\n"
    );
}

#[tokio::test]
async fn stream_upstream_error_is_reported_before_streaming() {
    let upstream = CannedUpstream::new(500, UpstreamBodyKind::Json("backend down"));
    let resp = app(&upstream, key())
        .oneshot(post("/api/chat/stream", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({
            "error": "Failed to process chat request",
            "details": "Gemini API Error: 500 - backend down"
        })
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn stream_without_key_makes_no_upstream_call() {
    let upstream = CannedUpstream::new(200, UpstreamBodyKind::Sse(&[]));
    let resp = app(&upstream, Credential::Missing)
        .oneshot(post("/api/chat/stream", CONVERSATION))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "Failed to process chat request");
    assert!(
        body["details"]
            .as_str()
            .unwrap()
            .contains("GOOGLE_GENERATIVE_AI_API_KEY")
    );
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn healthz_answers_without_upstream() {
    let upstream = CannedUpstream::new(200, UpstreamBodyKind::Json("{}"));
    let resp = app(&upstream, Credential::Missing)
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"ok");
    assert_eq!(upstream.calls(), 0);
}
