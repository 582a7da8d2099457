use serde::{Deserialize, Serialize};

use crate::gemini::generate_content::types::{Content, GenerationConfig, SafetySetting};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateContentPath {
    /// Format: models/{model}.
    pub model: String,
}

impl GenerateContentPath {
    /// Accepts both `gemini-pro` and `models/gemini-pro`.
    pub fn new(model: &str) -> Self {
        let model = model.trim();
        if model.starts_with("models/") {
            Self {
                model: model.to_string(),
            }
        } else {
            Self {
                model: format!("models/{model}"),
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequestBody {
    /// Required. The content of the current conversation with the model.
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

#[derive(Debug, Clone)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}
