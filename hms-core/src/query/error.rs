//! Query error type.

use thiserror::Error;

use crate::models::ValidationError;
use crate::transport::TransportError;

/// Errors surfaced by reads and writes through the query client.
///
/// Cloneable so one failed fetch can be handed to every consumer that shared
/// the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("Server returned status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// The body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Rejected before submission
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// The query is disabled and holds no data
    #[error("Query is disabled: {0}")]
    Disabled(String),
}

impl QueryError {
    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<TransportError> for QueryError {
    fn from(e: TransportError) -> Self {
        QueryError::Transport(e.to_string())
    }
}

impl From<ValidationError> for QueryError {
    fn from(e: ValidationError) -> Self {
        QueryError::Validation(e)
    }
}
