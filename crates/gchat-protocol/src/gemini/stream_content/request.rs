use crate::gemini::generate_content::request::{GenerateContentPath, GenerateContentRequestBody};

#[derive(Debug, Clone)]
pub struct StreamGenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}

impl StreamGenerateContentRequest {
    /// Upstream only frames the stream as `data:` lines when asked for SSE.
    pub const QUERY: &'static str = "alt=sse";
}
