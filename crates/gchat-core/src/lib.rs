pub mod error;
pub mod relay;
pub mod upstream_client;

pub use error::RelayError;
pub use relay::{AttemptPlan, CredentialPlacement, FrameStream, Relay, should_fall_back};
pub use upstream_client::{
    ByteStream, Headers, HttpMethod, UpstreamBody, UpstreamClient, UpstreamClientConfig,
    UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse, UpstreamTransportErrorKind,
    WreqUpstreamClient, header_get, header_set,
};
