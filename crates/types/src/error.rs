//! Error taxonomy shared by all query components.

use std::fmt::Display;

/// The three failure kinds a query can end in.
///
/// `NotFound` and `InvalidInput` are caller-facing outcomes; only
/// `UpstreamUnavailable` signals that a dependency (database, LCD/RPC) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplorerError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl ExplorerError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Alternate formatting keeps the whole context chain of `anyhow` errors.
    pub fn upstream<E: Display>(err: E) -> Self {
        Self::UpstreamUnavailable(format!("{err:#}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
