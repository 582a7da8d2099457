use serde_json::Value;

const FIRST_TEXT: &str = "/candidates/0/content/parts/0/text";

/// View over a `generateContent` (or stream chunk) payload.
///
/// Only the path the relay reads is interpreted. Every other field stays raw,
/// so an unexpected value elsewhere (a new role, an oversized token count)
/// never hides the reply text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateContentResponse {
    payload: Value,
}

impl GenerateContentResponse {
    pub fn from_value(payload: Value) -> Self {
        Self { payload }
    }

    /// `candidates[0].content.parts[0].text`, `None` at the first missing step.
    pub fn first_text(&self) -> Option<&str> {
        self.payload.pointer(FIRST_TEXT).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_text_follows_first_candidate_first_part() {
        let resp = GenerateContentResponse::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello!" }, { "text": "ignored" }], "role": "model" } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }));
        assert_eq!(resp.first_text(), Some("Hello!"));
    }

    #[test]
    fn first_text_is_absent_at_every_missing_step() {
        for value in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "finishReason": "SAFETY" }] }),
            json!({ "candidates": [{ "content": { "role": "model" } }] }),
            json!({ "candidates": [{ "content": { "parts": [{}] } }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": 7 }] } }] }),
            json!({ "candidates": "not a list" }),
            json!([1, 2, 3]),
        ] {
            assert_eq!(GenerateContentResponse::from_value(value).first_text(), None);
        }
    }

    #[test]
    fn unexpected_sibling_fields_do_not_hide_text() {
        for value in [
            json!({ "candidates": [{ "content": { "role": "function", "parts": [{ "text": "Hi" }] } }] }),
            json!({ "candidates": [{ "index": -1, "content": { "parts": [{ "text": "Hi" }] } }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": "Hi", "thought": "yes" }] } }] }),
            json!({
                "candidates": [{ "content": { "parts": [{ "text": "Hi" }] } }],
                "usageMetadata": { "totalTokenCount": 5_000_000_000u64 }
            }),
        ] {
            assert_eq!(
                GenerateContentResponse::from_value(value).first_text(),
                Some("Hi")
            );
        }
    }
}
