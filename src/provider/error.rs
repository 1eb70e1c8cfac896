use std::time::Duration;

use thiserror::Error;

/// Errors from the external categorization service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport or API failure.
    #[error("categorization request failed: {reason}")]
    Request { reason: String },

    /// No answer within the per-call timeout.
    #[error("categorization request timed out after {after:?}")]
    Timeout { after: Duration },

    /// The service answered with no text.
    #[error("categorization service returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    pub fn request(reason: impl Into<String>) -> Self {
        ProviderError::Request {
            reason: reason.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
