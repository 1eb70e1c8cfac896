use thiserror::Error;

/// Errors raised while admitting an external call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("concurrency gate closed")]
    GateClosed,
}

pub type DispatchResult<T> = Result<T, DispatchError>;
