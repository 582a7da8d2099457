use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use wreq::{Client, Method, Proxy};

use gchat_common::GlobalConfig;

pub type Headers = Vec<(String, String)>;

/// Upstream body chunks, pulled on demand by the consumer.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamFailure>> + Send>>;

pub trait UpstreamClient: Send + Sync {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub is_stream: bool,
}

pub enum UpstreamBody {
    Bytes(Bytes),
    Stream(ByteStream),
}

impl fmt::Debug for UpstreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamBody::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            UpstreamBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drains the body into one buffer, whichever shape it arrived in.
    pub async fn into_bytes(self) -> Result<Bytes, UpstreamFailure> {
        match self.body {
            UpstreamBody::Bytes(bytes) => Ok(bytes),
            UpstreamBody::Stream(mut stream) => {
                let mut out = Vec::new();
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(out))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamTransportErrorKind {
    Timeout,
    ReadTimeout,
    Connect,
    Dns,
    Tls,
    Other,
}

impl UpstreamTransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamTransportErrorKind::Timeout => "timeout",
            UpstreamTransportErrorKind::ReadTimeout => "read_timeout",
            UpstreamTransportErrorKind::Connect => "connect",
            UpstreamTransportErrorKind::Dns => "dns",
            UpstreamTransportErrorKind::Tls => "tls",
            UpstreamTransportErrorKind::Other => "other",
        }
    }
}

/// Transport-level failure: no HTTP response, or the body broke off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    Transport {
        kind: UpstreamTransportErrorKind,
        message: String,
    },
}

impl UpstreamFailure {
    pub fn transport(kind: UpstreamTransportErrorKind, message: impl Into<String>) -> Self {
        UpstreamFailure::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UpstreamFailure::Transport { message, .. } => message,
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamFailure::Transport { kind, message } => {
                write!(f, "{} error: {}", kind.as_str(), message)
            }
        }
    }
}

pub fn header_set(headers: &mut Headers, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    let value = value.into();
    let key = name.to_ascii_lowercase();
    if let Some((_, v)) = headers
        .iter_mut()
        .find(|(k, _)| k.to_ascii_lowercase() == key)
    {
        *v = value;
        return;
    }
    headers.push((name, value));
}

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    let key = name.to_ascii_lowercase();
    headers
        .iter()
        .find(|(k, _)| k.to_ascii_lowercase() == key)
        .map(|(_, v)| v.as_str())
}

#[derive(Debug, Clone, Default)]
pub struct UpstreamClientConfig {
    pub proxy: Option<String>,
    /// Unset means no limit.
    pub connect_timeout: Option<Duration>,
    /// Unset means no limit; applies to the whole exchange including the body.
    pub request_timeout: Option<Duration>,
}

impl UpstreamClientConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            proxy: global.proxy.clone(),
            connect_timeout: global.connect_timeout,
            request_timeout: global.request_timeout,
        }
    }
}

#[derive(Clone)]
pub struct WreqUpstreamClient {
    client: Client,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        Ok(Self {
            client: build_client(&config)?,
        })
    }
}

fn build_client(config: &UpstreamClientConfig) -> Result<Client, wreq::Error> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(proxy) = config.proxy.as_deref() {
        builder = builder.proxy(Proxy::all(proxy)?);
    }
    builder.build()
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            let method = http_method_to_wreq(req.method);
            let mut builder = self.client.request(method, &req.url);

            for (k, v) in &req.headers {
                builder = builder.header(k, v);
            }

            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await.map_err(map_wreq_error)?;
            convert_response(resp, req.is_stream).await
        })
    }
}

fn http_method_to_wreq(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Post => Method::POST,
    }
}

async fn convert_response(
    resp: wreq::Response,
    want_stream: bool,
) -> Result<UpstreamHttpResponse, UpstreamFailure> {
    let status = resp.status().as_u16();

    let is_success = (200..300).contains(&status);
    if !is_success || !want_stream {
        let body = resp.bytes().await.map_err(map_wreq_error)?;
        return Ok(UpstreamHttpResponse {
            status,
            body: UpstreamBody::Bytes(body),
        });
    }

    let stream = resp
        .bytes_stream()
        .map(|item| item.map_err(map_wreq_error));
    Ok(UpstreamHttpResponse {
        status,
        body: UpstreamBody::Stream(Box::pin(stream)),
    })
}

fn map_wreq_error(err: wreq::Error) -> UpstreamFailure {
    let kind = classify_wreq_error(&err);
    UpstreamFailure::Transport {
        kind,
        message: err.to_string(),
    }
}

fn classify_wreq_error(err: &wreq::Error) -> UpstreamTransportErrorKind {
    let message = err.to_string().to_ascii_lowercase();
    if err.is_timeout() {
        if message.contains("read") || message.contains("idle") {
            return UpstreamTransportErrorKind::ReadTimeout;
        }
        return UpstreamTransportErrorKind::Timeout;
    }
    if err.is_connect() {
        if message.contains("dns") || message.contains("resolve") {
            return UpstreamTransportErrorKind::Dns;
        }
        if message.contains("tls") || message.contains("ssl") {
            return UpstreamTransportErrorKind::Tls;
        }
        return UpstreamTransportErrorKind::Connect;
    }
    if err.is_connection_reset() {
        return UpstreamTransportErrorKind::Connect;
    }
    if message.contains("tls") || message.contains("ssl") {
        return UpstreamTransportErrorKind::Tls;
    }
    UpstreamTransportErrorKind::Other
}
