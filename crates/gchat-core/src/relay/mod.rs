use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{info, warn};

use gchat_common::GlobalConfig;
use gchat_protocol::gemini::generate_content::request::GenerateContentPath;

use crate::error::RelayError;
use crate::upstream_client::{
    UpstreamClient, UpstreamClientConfig, UpstreamHttpRequest, UpstreamHttpResponse,
    WreqUpstreamClient,
};

pub mod attempt;
mod generate;
mod stream;

pub use attempt::{AttemptPlan, CredentialPlacement, should_fall_back};
pub use stream::{FrameStream, relay_frames};

/// Both relays over one upstream client and one immutable config.
#[derive(Clone)]
pub struct Relay {
    client: Arc<dyn UpstreamClient>,
    config: Arc<GlobalConfig>,
}

impl Relay {
    pub fn new(client: Arc<dyn UpstreamClient>, config: GlobalConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: GlobalConfig) -> Result<Self, wreq::Error> {
        let client = WreqUpstreamClient::new(UpstreamClientConfig::from_global(&config))?;
        Ok(Self::new(Arc::new(client), config))
    }

    fn api_key(&self) -> Result<&str, RelayError> {
        self.config
            .credential
            .api_key()
            .ok_or(RelayError::MissingCredential)
    }

    /// `{base}/v1beta/models/{model}:{method}`
    fn endpoint(&self, path: &GenerateContentPath, method: &str) -> String {
        format!("{}/v1beta/{}:{}", self.config.base_url, path.model, method)
    }

    async fn send_logged(
        &self,
        trace_id: &str,
        op: &str,
        placement: CredentialPlacement,
        req: UpstreamHttpRequest,
    ) -> Result<UpstreamHttpResponse, RelayError> {
        let is_stream = req.is_stream;
        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            op = %op,
            method = %req.method.as_str(),
            placement = %placement.as_str(),
            is_stream = is_stream
        );
        let started_at = Instant::now();
        match self.client.send(req).await {
            Ok(resp) => {
                info!(
                    event = "upstream_response",
                    trace_id = %trace_id,
                    op = %op,
                    placement = %placement.as_str(),
                    status = resp.status,
                    elapsed_ms = started_at.elapsed().as_millis(),
                    is_stream = is_stream
                );
                Ok(resp)
            }
            Err(err) => {
                warn!(
                    event = "upstream_response",
                    trace_id = %trace_id,
                    op = %op,
                    placement = %placement.as_str(),
                    status = "error",
                    elapsed_ms = started_at.elapsed().as_millis(),
                    error = %err
                );
                Err(RelayError::Transport(err.message().to_string()))
            }
        }
    }
}

fn encode_body<T: serde::Serialize>(body: &T) -> Result<Bytes, RelayError> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|err| RelayError::Internal(err.to_string()))
}
