use http::StatusCode;

/// Every way a relay call can fail before a reply (or stream) exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error(
        "Missing GOOGLE_GENERATIVE_AI_API_KEY. Set it in the environment (or pass --api-key) and restart the server."
    )]
    MissingCredential,
    /// Non-2xx upstream answer; `message` is already formatted for the caller.
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Gemini returned malformed JSON")]
    MalformedUpstream,
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::MalformedUpstream => StatusCode::BAD_GATEWAY,
            RelayError::Transport(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
