use std::fmt;
use std::time::Duration;

pub const API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_STREAM_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
    #[error("invalid global config field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Upstream API key as resolved at startup.
///
/// A missing key is a normal state: the server still starts and every chat
/// request answers with a configuration error until the key is provided.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Missing,
}

impl Credential {
    /// Blank or whitespace-only values count as missing.
    pub fn from_raw(value: Option<String>) -> Self {
        match value.map(|item| item.trim().to_string()) {
            Some(key) if !key.is_empty() => Credential::ApiKey(key),
            _ => Credential::Missing,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            Credential::ApiKey(key) => Some(key.as_str()),
            Credential::Missing => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Credential::ApiKey(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::Missing => f.write_str("Missing"),
        }
    }
}

/// Final, merged configuration used by the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    pub credential: Credential,
    /// Upstream origin, without the `/v1beta` path.
    pub base_url: String,
    /// Model used by the single-shot route.
    pub model: String,
    /// Model used by the streaming route.
    pub stream_model: String,
    /// Optional outbound proxy (for upstream egress).
    pub proxy: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl GlobalConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            credential: Credential::Missing,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream_model: DEFAULT_STREAM_MODEL.to_string(),
            proxy: None,
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

/// Optional layer used for merging global config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub stream_model: Option<String>,
    pub proxy: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl GlobalConfigPatch {
    /// Fields set in `other` win.
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.stream_model.is_some() {
            self.stream_model = other.stream_model;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.connect_timeout.is_some() {
            self.connect_timeout = other.connect_timeout;
        }
        if other.request_timeout.is_some() {
            self.request_timeout = other.request_timeout;
        }
    }

    pub fn into_config(self) -> Result<GlobalConfig, GlobalConfigError> {
        let defaults = GlobalConfig::default();
        let port = self.port.unwrap_or(defaults.port);
        if port == 0 {
            return Err(GlobalConfigError::InvalidField {
                field: "port",
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        let base_url = non_blank(self.base_url)
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GlobalConfigError::InvalidField {
                field: "base_url",
                reason: format!("expected an http(s) url, got {base_url:?}"),
            });
        }
        Ok(GlobalConfig {
            host: non_blank(self.host).unwrap_or(defaults.host),
            port,
            credential: Credential::from_raw(self.api_key),
            base_url,
            model: required_model("model", self.model, defaults.model)?,
            stream_model: required_model("stream_model", self.stream_model, defaults.stream_model)?,
            proxy: non_blank(self.proxy),
            connect_timeout: self.connect_timeout.filter(|value| !value.is_zero()),
            request_timeout: self.request_timeout.filter(|value| !value.is_zero()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}

fn required_model(
    field: &'static str,
    value: Option<String>,
    default: String,
) -> Result<String, GlobalConfigError> {
    match value {
        None => Ok(default),
        Some(model) => non_blank(Some(model)).ok_or(GlobalConfigError::MissingField(field)),
    }
}
