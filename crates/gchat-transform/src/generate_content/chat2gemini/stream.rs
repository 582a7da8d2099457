use bytes::Bytes;
use serde_json::Value as JsonValue;

use gchat_protocol::chat::RelayEvent;
use gchat_protocol::gemini::stream_content::response::StreamGenerateContentResponse;
use gchat_protocol::sse::{DataLineDecoder, encode_data_frame};

/// Turns upstream `streamGenerateContent?alt=sse` bytes into relay events.
///
/// Lines whose payload is not JSON, or that outgrow the line cap, are counted
/// and dropped; they never end the stream. Chunks without text (usage-only or
/// finish-only) emit nothing.
#[derive(Debug)]
pub struct GeminiToChatStreamState {
    decoder: DataLineDecoder,
    emitted: usize,
    dropped: usize,
}

impl GeminiToChatStreamState {
    pub fn new() -> Self {
        Self {
            decoder: DataLineDecoder::new(),
            emitted: 0,
            dropped: 0,
        }
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            decoder: DataLineDecoder::with_max_line_bytes(max_line_bytes),
            ..Self::new()
        }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<RelayEvent> {
        let payloads = self.decoder.push_bytes(chunk);
        self.transform_payloads(payloads)
    }

    /// Upstream closed; flush whatever line was left without a newline.
    pub fn finish(&mut self) -> Vec<RelayEvent> {
        let payloads = self.decoder.finish();
        self.transform_payloads(payloads)
    }

    pub fn transform_payload(&mut self, payload: &str) -> Option<RelayEvent> {
        let Ok(value) = serde_json::from_str::<JsonValue>(payload) else {
            self.dropped += 1;
            return None;
        };
        let response = StreamGenerateContentResponse::from_value(value);
        let text = response.first_text().filter(|text| !text.is_empty())?;
        self.emitted += 1;
        Some(RelayEvent {
            content: text.to_string(),
        })
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn dropped(&self) -> usize {
        self.dropped + self.decoder.overflowed()
    }

    fn transform_payloads(&mut self, payloads: Vec<String>) -> Vec<RelayEvent> {
        payloads
            .iter()
            .filter_map(|payload| self.transform_payload(payload))
            .collect()
    }
}

impl Default for GeminiToChatStreamState {
    fn default() -> Self {
        Self::new()
    }
}

/// `data: {"content":"..."}\n\n`
pub fn encode_event(event: &RelayEvent) -> Result<Bytes, serde_json::Error> {
    let payload = serde_json::to_string(event)?;
    Ok(encode_data_frame(&payload))
}
