use crate::gemini::generate_content::response::GenerateContentResponse;

/// Every `data:` payload of the upstream stream is a partial
/// `GenerateContentResponse`.
pub type StreamGenerateContentResponse = GenerateContentResponse;
