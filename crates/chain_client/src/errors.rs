use cosmex_types::ExplorerError;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the chain.
#[derive(Debug, Error)]
pub enum ChainClientError {
    #[error("{0} not found on chain")]
    NotFound(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("cannot decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("invalid LCD url {0}")]
    InvalidUrl(String),

    #[error("{path} still had more results after {pages} pages")]
    TooManyPages { path: String, pages: usize },
}

impl ChainClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainClientError::NotFound(_))
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainClientError::Timeout(_) | ChainClientError::Http(_) => true,
            ChainClientError::Status { status, .. } => *status == 429 || *status >= 500,
            ChainClientError::NotFound(_)
            | ChainClientError::Decode { .. }
            | ChainClientError::InvalidUrl(_)
            | ChainClientError::TooManyPages { .. } => false,
        }
    }
}

impl From<ChainClientError> for ExplorerError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::NotFound(what) => ExplorerError::not_found(what),
            other => ExplorerError::upstream(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainClientError>;
