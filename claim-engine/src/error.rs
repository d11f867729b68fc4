use thiserror::Error;

/// Why a call to the external decision service failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("decision service unreachable: {0}")]
    ConnectionRefused(String),

    #[error("decision service timed out: {0}")]
    Timeout(String),

    #[error("decision service returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("decision service failed with status {status}: {message}")]
    Application { status: u16, message: String },

    #[error("decision service request failed: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// Stable machine-readable code for the failure kind.
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::ConnectionRefused(_) => "connection_refused",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::MalformedResponse(_) => "malformed_response",
            UpstreamError::Application { .. } => "application_error",
            UpstreamError::Transport(_) => "transport_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("storage error: {0}")]
    Persistence(String),

    #[error("claim query not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ClaimError {
    fn from(err: sqlx::Error) -> Self {
        ClaimError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClaimError>;
