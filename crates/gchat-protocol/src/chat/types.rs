use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    #[default]
    User,
    Assistant,
}

impl ChatRole {
    /// Only the exact string `"assistant"` selects `Assistant`; anything else,
    /// including a missing or non-string role, is a user turn.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("assistant") => ChatRole::Assistant,
            _ => ChatRole::User,
        }
    }
}

impl<'de> Deserialize<'de> for ChatRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ChatRole::from_value(Some(&value)))
    }
}

/// One message of the conversation as the browser client sends it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChatTurn {
    /// Opaque, client assigned. May be empty and may repeat.
    pub id: String,
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            role,
            content: content.into(),
        }
    }

    /// Total over arbitrary JSON: non-object entries become an empty user turn.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            id: map.get("id").map(coerce_text).unwrap_or_default(),
            role: ChatRole::from_value(map.get("role")),
            content: map.get("content").map(coerce_text).unwrap_or_default(),
        }
    }
}

impl<'de> Deserialize<'de> for ChatTurn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ChatTurn::from_value(&value))
    }
}

/// Inbound body of both chat routes: `{ "messages": ChatTurn[] }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Never fails. An empty, unparseable or oddly shaped body is an empty
    /// conversation.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let messages = value
            .get("messages")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(ChatTurn::from_value).collect())
            .unwrap_or_default();
        Self { messages }
    }
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ChatRequest::from_value(&value))
    }
}

/// String coercion used for turn fields: null is empty, strings pass through,
/// scalars use their textual form and containers their compact JSON.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
