use serde::{Deserialize, Serialize};

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ErrorResponse {
    /// `error.message` of a JSON error body, if the body is one.
    pub fn message_from_slice(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|resp| resp.error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_from_envelope() {
        let body = br#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            ErrorResponse::message_from_slice(body).as_deref(),
            Some("API key not valid.")
        );
    }

    #[test]
    fn no_message_for_other_bodies() {
        assert_eq!(ErrorResponse::message_from_slice(b"Internal Server Error"), None);
        assert_eq!(ErrorResponse::message_from_slice(br#"{"error":{"code":500}}"#), None);
        assert_eq!(ErrorResponse::message_from_slice(br#"{"error":"flat"}"#), None);
    }
}
