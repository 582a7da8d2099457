use bytes::Bytes;

use crate::error::RelayError;
use crate::upstream_client::{Headers, HttpMethod, UpstreamHttpRequest, header_set};

pub const API_KEY_HEADER: &str = "x-goog-api-key";
pub const API_KEY_QUERY: &str = "key";

/// Where the API key travels on one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    Query,
    Header,
}

impl CredentialPlacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialPlacement::Query => "query",
            CredentialPlacement::Header => "header",
        }
    }
}

/// Ordered credential placements tried for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPlan {
    placements: Vec<CredentialPlacement>,
}

impl AttemptPlan {
    /// Query key first, then one retry with the header key.
    pub fn single_shot() -> Self {
        Self {
            placements: vec![CredentialPlacement::Query, CredentialPlacement::Header],
        }
    }

    pub fn placements(&self) -> &[CredentialPlacement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// True exactly for non-2xx statuses in 400..=403.
pub fn should_fall_back(status: u16) -> bool {
    !(200..300).contains(&status) && (400..=403).contains(&status)
}

/// Builds one upstream POST with the key placed per `placement`.
pub fn attempt_request(
    placement: CredentialPlacement,
    endpoint: &str,
    extra_query: Option<&str>,
    api_key: &str,
    body: Bytes,
    is_stream: bool,
) -> Result<UpstreamHttpRequest, RelayError> {
    let mut query: Vec<String> = extra_query.map(str::to_string).into_iter().collect();
    let mut headers = Headers::new();
    header_set(&mut headers, "content-type", "application/json");
    match placement {
        CredentialPlacement::Query => {
            let pair = serde_urlencoded::to_string([(API_KEY_QUERY, api_key)])
                .map_err(|err| RelayError::Internal(err.to_string()))?;
            query.push(pair);
        }
        CredentialPlacement::Header => header_set(&mut headers, API_KEY_HEADER, api_key),
    }
    let url = if query.is_empty() {
        endpoint.to_string()
    } else {
        format!("{endpoint}?{}", query.join("&"))
    };
    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url,
        headers,
        body: Some(body),
        is_stream,
    })
}
