use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, future, stream};
use tracing::{debug, info, warn};

use gchat_protocol::chat::{ChatRequest, RelayEvent};
use gchat_protocol::gemini::stream_content::request::StreamGenerateContentRequest;
use gchat_transform::generate_content::chat2gemini::{
    GeminiToChatStreamState, encode_event, transform_stream_request,
};

use super::attempt::{CredentialPlacement, attempt_request};
use super::{Relay, encode_body};
use crate::error::RelayError;
use crate::upstream_client::{ByteStream, UpstreamBody};

const OP: &str = "stream_generate_content";

/// Downstream `data: {"content":...}\n\n` frames.
pub type FrameStream = Pin<Box<dyn Stream<Item = Bytes> + Send>>;

impl Relay {
    /// Streaming relay. Errors are only returned before the first frame; once
    /// the stream exists, upstream faults end it quietly.
    pub async fn stream(&self, trace_id: &str, body: &[u8]) -> Result<FrameStream, RelayError> {
        let api_key = self.api_key()?;
        let request = ChatRequest::from_slice(body);
        let upstream = transform_stream_request(&self.config.stream_model, &request);
        let endpoint = self.endpoint(&upstream.path, "streamGenerateContent");
        let payload = encode_body(&upstream.body)?;

        // No fallback here: the stream endpoint always gets the query key.
        let placement = CredentialPlacement::Query;
        let req = attempt_request(
            placement,
            &endpoint,
            Some(StreamGenerateContentRequest::QUERY),
            api_key,
            payload,
            true,
        )?;
        let resp = self.send_logged(trace_id, OP, placement, req).await?;
        if !resp.is_success() {
            let status = resp.status;
            let body = resp
                .into_bytes()
                .await
                .map_err(|err| RelayError::Transport(err.message().to_string()))?;
            return Err(RelayError::Upstream {
                status,
                message: format!(
                    "Gemini API Error: {status} - {}",
                    String::from_utf8_lossy(&body)
                ),
            });
        }

        let upstream: ByteStream = match resp.body {
            UpstreamBody::Stream(body) => body,
            UpstreamBody::Bytes(bytes) => Box::pin(stream::iter([Ok(bytes)])),
        };
        Ok(relay_frames(trace_id.to_string(), upstream))
    }
}

/// Pull-based frame pipeline: one upstream chunk is read only when the
/// consumer asks for a frame and nothing is queued.
///
/// A panic while producing a frame ends the stream after the frames already
/// sent; the connection closes as if upstream had finished.
pub fn relay_frames(trace_id: String, upstream: ByteStream) -> FrameStream {
    let trace = trace_id.clone();
    let state = FrameRelay {
        trace_id,
        upstream,
        transform: GeminiToChatStreamState::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    let frames = stream::unfold(state, |mut state| async move {
        let frame = state.next_frame().await?;
        Some((frame, state))
    });
    Box::pin(
        AssertUnwindSafe(frames)
            .catch_unwind()
            .filter_map(move |item| {
                future::ready(match item {
                    Ok(frame) => Some(frame),
                    Err(_) => {
                        warn!(event = "stream_aborted", trace_id = %trace, reason = "panic");
                        None
                    }
                })
            }),
    )
}

struct FrameRelay {
    trace_id: String,
    upstream: ByteStream,
    transform: GeminiToChatStreamState,
    pending: VecDeque<Bytes>,
    finished: bool,
}

impl FrameRelay {
    async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(frame);
            }
            if self.finished {
                return None;
            }
            let dropped_before = self.transform.dropped();
            match self.upstream.next().await {
                Some(Ok(chunk)) => {
                    let events = self.transform.push_chunk(&chunk);
                    self.enqueue(events, dropped_before);
                }
                Some(Err(err)) => {
                    self.finished = true;
                    warn!(
                        event = "stream_aborted",
                        trace_id = %self.trace_id,
                        emitted = self.transform.emitted(),
                        error = %err
                    );
                }
                None => {
                    let events = self.transform.finish();
                    self.enqueue(events, dropped_before);
                    self.finished = true;
                    info!(
                        event = "stream_completed",
                        trace_id = %self.trace_id,
                        emitted = self.transform.emitted(),
                        dropped = self.transform.dropped()
                    );
                }
            }
        }
    }

    fn enqueue(&mut self, events: Vec<RelayEvent>, dropped_before: usize) {
        let dropped = self.transform.dropped() - dropped_before;
        if dropped > 0 {
            debug!(
                event = "stream_frame_dropped",
                trace_id = %self.trace_id,
                count = dropped
            );
        }
        for event in &events {
            match encode_event(event) {
                Ok(frame) => self.pending.push_back(frame),
                Err(err) => warn!(
                    event = "stream_frame_dropped",
                    trace_id = %self.trace_id,
                    error = %err
                ),
            }
        }
    }
}
