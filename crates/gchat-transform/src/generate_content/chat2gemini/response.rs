use gchat_protocol::chat::ReplyResult;
use gchat_protocol::gemini::generate_content::response::GenerateContentResponse as GeminiGenerateContentResponse;

/// Reply content used when upstream succeeded but produced no text.
pub const EMPTY_REPLY: &str = "(empty reply)";

pub fn reply_text(response: &GeminiGenerateContentResponse) -> &str {
    response.first_text().unwrap_or(EMPTY_REPLY)
}

/// Convert a Gemini generate-content response into the assistant reply.
pub fn transform_response(
    id: impl Into<String>,
    response: &GeminiGenerateContentResponse,
) -> ReplyResult {
    ReplyResult::assistant(id, reply_text(response))
}
