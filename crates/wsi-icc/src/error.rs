//! ICC error types.

use thiserror::Error;

/// Result type for ICC operations.
pub type IccResult<T> = Result<T, IccError>;

/// Errors that can occur while loading color metadata.
///
/// Both variants are resource-unavailable conditions: the caller degrades
/// to the disabled state and logs, it never propagates these to the host.
#[derive(Debug, Error)]
pub enum IccError {
    /// The metadata fetch itself failed (network, missing slide).
    #[error("failed to fetch color metadata: {0}")]
    FetchFailed(String),

    /// The payload was not valid JSON or did not match the expected shape.
    #[error("malformed color metadata: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl IccError {
    /// Creates an [`IccError::FetchFailed`] error.
    #[inline]
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::FetchFailed(reason.into())
    }
}
