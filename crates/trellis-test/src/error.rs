//! Test error types.

use thiserror::Error;
use trellis_core::DispatchError;

/// Errors that can occur during testing.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed
    #[error("Request build error: {0}")]
    RequestBuild(String),
    /// Header name or value is invalid
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// Response body reading failed
    #[error("Body read error: {0}")]
    BodyRead(String),
    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The dispatcher returned an error instead of a response
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}
