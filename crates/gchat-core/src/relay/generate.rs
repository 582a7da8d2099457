use bytes::Bytes;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use tracing::info;

use gchat_protocol::chat::{ChatRequest, ReplyResult};
use gchat_protocol::gemini::error::ErrorResponse;
use gchat_protocol::gemini::generate_content::response::GenerateContentResponse;
use gchat_transform::generate_content::chat2gemini::{transform_request, transform_response};

use super::attempt::{AttemptPlan, attempt_request, should_fall_back};
use super::{Relay, encode_body};
use crate::error::RelayError;

const OP: &str = "generate_content";

impl Relay {
    /// Single-shot relay: one reply for the whole conversation in `body`.
    ///
    /// The body is parsed leniently; anything unusable becomes an empty
    /// conversation rather than an error.
    pub async fn generate(&self, trace_id: &str, body: &[u8]) -> Result<ReplyResult, RelayError> {
        let api_key = self.api_key()?;
        let request = ChatRequest::from_slice(body);
        let upstream = transform_request(&self.config.model, &request);
        let endpoint = self.endpoint(&upstream.path, "generateContent");
        let payload = encode_body(&upstream.body)?;

        let plan = AttemptPlan::single_shot();
        let mut last_failure: Option<(u16, Bytes)> = None;
        for placement in plan.placements() {
            if let Some((status, _)) = &last_failure {
                info!(
                    event = "credential_fallback",
                    trace_id = %trace_id,
                    previous_status = *status,
                    placement = %placement.as_str()
                );
            }
            let req = attempt_request(*placement, &endpoint, None, api_key, payload.clone(), false)?;
            let resp = self.send_logged(trace_id, OP, *placement, req).await?;
            let status = resp.status;
            let success = resp.is_success();
            let bytes = resp
                .into_bytes()
                .await
                .map_err(|err| RelayError::Transport(err.message().to_string()))?;
            if success {
                return reply_from_slice(&bytes);
            }
            let fall_back = should_fall_back(status);
            last_failure = Some((status, bytes));
            if !fall_back {
                break;
            }
        }

        let (status, bytes) = last_failure
            .ok_or_else(|| RelayError::Internal("attempt plan produced no response".to_string()))?;
        let message = ErrorResponse::message_from_slice(&bytes)
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned());
        Err(RelayError::Upstream {
            status,
            message: format!("Gemini API error: {message}"),
        })
    }
}

fn reply_from_slice(bytes: &[u8]) -> Result<ReplyResult, RelayError> {
    let value: JsonValue =
        serde_json::from_slice(bytes).map_err(|_| RelayError::MalformedUpstream)?;
    let response = GenerateContentResponse::from_value(value);
    Ok(transform_response(reply_id(), &response))
}

/// Current Unix time in milliseconds.
fn reply_id() -> String {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string()
}
