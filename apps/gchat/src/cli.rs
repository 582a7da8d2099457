use std::time::Duration;

use clap::Parser;

use gchat_common::GlobalConfigPatch;

#[derive(Parser, Debug)]
#[command(name = "gchat", about = "Chat relay in front of the Gemini API")]
pub(crate) struct Cli {
    #[arg(long, env = "GCHAT_HOST")]
    pub(crate) host: Option<String>,
    #[arg(long, env = "GCHAT_PORT")]
    pub(crate) port: Option<u16>,
    #[arg(long, env = "GOOGLE_GENERATIVE_AI_API_KEY", hide_env_values = true)]
    pub(crate) api_key: Option<String>,
    /// Upstream origin, e.g. https://generativelanguage.googleapis.com
    #[arg(long, env = "GCHAT_BASE_URL")]
    pub(crate) base_url: Option<String>,
    /// Model for POST /api/chat.
    #[arg(long, env = "GCHAT_MODEL")]
    pub(crate) model: Option<String>,
    /// Model for POST /api/chat/stream.
    #[arg(long, env = "GCHAT_STREAM_MODEL")]
    pub(crate) stream_model: Option<String>,
    #[arg(long, env = "GCHAT_PROXY")]
    pub(crate) proxy: Option<String>,
    #[arg(long, env = "GCHAT_CONNECT_TIMEOUT_SECS")]
    pub(crate) connect_timeout_secs: Option<u64>,
    #[arg(long, env = "GCHAT_REQUEST_TIMEOUT_SECS")]
    pub(crate) request_timeout_secs: Option<u64>,
}

impl Cli {
    pub(crate) fn into_patch(self) -> GlobalConfigPatch {
        GlobalConfigPatch {
            host: self.host,
            port: self.port,
            api_key: self.api_key,
            base_url: self.base_url,
            model: self.model,
            stream_model: self.stream_model,
            proxy: self.proxy,
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
