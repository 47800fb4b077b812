//! HTTP transport used by the query client.
//!
//! The client only depends on the [`Transport`] trait. [`HttpTransport`] talks
//! to a real backend with `reqwest`; [`MockTransport`] answers from scripted
//! responses and records every request, for tests and offline work.

mod http;
mod mock;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};

/// HTTP methods the console uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Whether requests with this method carry a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Patch => write!(f, "PATCH"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Status and parsed body of one HTTP exchange.
///
/// Non-JSON bodies are kept as a JSON string; an empty body is `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Failures below the HTTP layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Sends a request to the backend and returns whatever status it answered.
///
/// Implementations must not treat non-2xx statuses as errors; that decision
/// belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError>;

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        self.send(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<TransportResponse, TransportError> {
        self.send(Method::Post, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<TransportResponse, TransportError> {
        self.send(Method::Put, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<TransportResponse, TransportError> {
        self.send(Method::Patch, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<TransportResponse, TransportError> {
        self.send(Method::Delete, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_method_has_body() {
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
        assert!(Method::Patch.has_body());
        assert!(!Method::Get.has_body());
        assert!(!Method::Delete.has_body());
    }

    #[test]
    fn test_into_reqwest_method() {
        assert_eq!(reqwest::Method::from(Method::Patch), reqwest::Method::PATCH);
    }
}
