//! Wire envelope used by every backend response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::QueryError;
use crate::transport::TransportResponse;

/// `{ "data": T, "message"?: string, "status": number }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
}

impl<T> Envelope<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self {
            data,
            message: None,
            status,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Checks the status and strips the envelope, returning the raw `data`.
    ///
    /// An empty success body (e.g. `204 No Content`) yields `null`.
    pub fn into_data(self) -> Result<Value, QueryError> {
        if !self.is_success() {
            let message = self
                .body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(QueryError::Status {
                status: self.status,
                message,
            });
        }

        if self.body.is_null() {
            return Ok(Value::Null);
        }

        let envelope: Envelope<Value> =
            serde_json::from_value(self.body).map_err(|e| QueryError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}
