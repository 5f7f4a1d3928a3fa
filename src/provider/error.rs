use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("no {0} data received")]
    EmptyPayload(&'static str),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Coarse classification used in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Transport,
    EmptyPayload,
    MalformedPayload,
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Transport(_) | ProviderError::Status(_) | ProviderError::Rejected(_) => {
                FailureKind::Transport
            }
            ProviderError::EmptyPayload(_) => FailureKind::EmptyPayload,
            ProviderError::Malformed(_) => FailureKind::MalformedPayload,
        }
    }

    pub fn is_empty_payload(&self) -> bool {
        matches!(self, ProviderError::EmptyPayload(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
