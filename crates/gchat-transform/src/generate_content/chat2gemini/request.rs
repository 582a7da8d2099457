use gchat_protocol::chat::{ChatRequest, ChatRole, ChatTurn};
use gchat_protocol::gemini::generate_content::request::{
    GenerateContentPath as GeminiGenerateContentPath,
    GenerateContentRequest as GeminiGenerateContentRequest,
    GenerateContentRequestBody as GeminiGenerateContentRequestBody,
};
use gchat_protocol::gemini::generate_content::types::{
    Content as GeminiContent, ContentRole as GeminiContentRole, GenerationConfig,
    HarmBlockThreshold, HarmCategory, SafetySetting,
};
use gchat_protocol::gemini::stream_content::request::StreamGenerateContentRequest;

const STREAM_TEMPERATURE: f64 = 0.7;
const STREAM_TOP_K: u32 = 40;
const STREAM_TOP_P: f64 = 0.95;
const STREAM_MAX_OUTPUT_TOKENS: u32 = 4000;

const BLOCKED_CATEGORIES: [HarmCategory; 4] = [
    HarmCategory::HarmCategoryHarassment,
    HarmCategory::HarmCategoryHateSpeech,
    HarmCategory::HarmCategorySexuallyExplicit,
    HarmCategory::HarmCategoryDangerousContent,
];

/// One Gemini content per turn, same order, text wrapped in a single part.
pub fn transform_turns(turns: &[ChatTurn]) -> Vec<GeminiContent> {
    turns
        .iter()
        .map(|turn| GeminiContent::text(map_role(turn.role), turn.content.clone()))
        .collect()
}

/// Single-shot request: only `contents` goes upstream.
pub fn transform_request(model: &str, request: &ChatRequest) -> GeminiGenerateContentRequest {
    GeminiGenerateContentRequest {
        path: GeminiGenerateContentPath::new(model),
        body: GeminiGenerateContentRequestBody {
            contents: transform_turns(&request.messages),
            generation_config: None,
            safety_settings: None,
        },
    }
}

/// Streaming request: `contents` plus the fixed sampling and safety policy.
pub fn transform_stream_request(model: &str, request: &ChatRequest) -> StreamGenerateContentRequest {
    StreamGenerateContentRequest {
        path: GeminiGenerateContentPath::new(model),
        body: GeminiGenerateContentRequestBody {
            contents: transform_turns(&request.messages),
            generation_config: Some(stream_generation_config()),
            safety_settings: Some(stream_safety_settings()),
        },
    }
}

pub fn stream_generation_config() -> GenerationConfig {
    GenerationConfig {
        temperature: Some(STREAM_TEMPERATURE),
        top_k: Some(STREAM_TOP_K),
        top_p: Some(STREAM_TOP_P),
        max_output_tokens: Some(STREAM_MAX_OUTPUT_TOKENS),
    }
}

pub fn stream_safety_settings() -> Vec<SafetySetting> {
    BLOCKED_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: *category,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .collect()
}

fn map_role(role: ChatRole) -> GeminiContentRole {
    match role {
        ChatRole::Assistant => GeminiContentRole::Model,
        ChatRole::User => GeminiContentRole::User,
    }
}
