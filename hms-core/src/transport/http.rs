//! `reqwest`-backed transport.

use async_trait::async_trait;
use serde_json::Value;

use super::{Method, Transport, TransportError, TransportResponse};

/// Transport that sends JSON requests to `base_url` + endpoint path.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the given base URL (e.g. `http://localhost:8080/api/v1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport around a preconfigured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the base URL and an endpoint path with exactly one slash.
    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.build_url(path);
        tracing::trace!(%method, %url, "sending request");

        let mut request = self
            .client
            .request(method.into(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        tracing::trace!(%method, %url, status, "received response");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let transport = HttpTransport::new("http://localhost:8080/api/v1");
        assert_eq!(
            transport.build_url("/patients"),
            "http://localhost:8080/api/v1/patients"
        );
    }

    #[test]
    fn test_build_url_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:8080/api/v1/");
        assert_eq!(
            transport.build_url("/staff/9/tasks"),
            "http://localhost:8080/api/v1/staff/9/tasks"
        );
    }

    #[test]
    fn test_build_url_relative_path() {
        let transport = HttpTransport::new("https://hospital.example.com");
        assert_eq!(
            transport.build_url("tasks"),
            "https://hospital.example.com/tasks"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is not expected to be listening on loopback
        let transport = HttpTransport::new("http://127.0.0.1:9");
        let result = transport.get("/patients").await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }
}
