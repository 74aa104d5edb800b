use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Inference server returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed inference response: {0}")]
    Protocol(String),
}

/// Coarse failure class. Both kinds look the same to the user but are logged apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Network,
    Protocol,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
        }
    }
}

impl InferenceError {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Request(_) | Self::Url(_) | Self::Status { .. } => FailureKind::Network,
            Self::Protocol(_) => FailureKind::Protocol,
        }
    }
}

pub type InferenceResult<T> = Result<T, InferenceError>;
