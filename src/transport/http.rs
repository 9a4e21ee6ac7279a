//! Request/response transport for the command channel.
//!
//! [`HttpTransport`] is the seam the command channel talks through;
//! [`ReqwestTransport`] is the default implementation.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Method
// ============================================================================

/// HTTP method for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT` (the controller's verb for state changes)
    #[default]
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the verb as sent on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

// ============================================================================
// HttpResponse
// ============================================================================

/// Status and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a response.
    #[inline]
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the body as text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body is not valid JSON (an empty body
    /// included).
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Issues HTTP-style requests against the controller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `method url` with an optional JSON body.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if no response arrives within `timeout`
    /// - [`Error::Connection`] for any other transport failure
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default client. No connection is opened.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing `reqwest` client.
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut builder = self.client.request(method.into(), url).timeout(timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::connection_timeout(format!("{method} {url}"), timeout)
            } else {
                Error::connection(format!("{method} {url} failed: {e}"))
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_err)?;

        trace!(%method, url, status, "HTTP response received");

        Ok(HttpResponse { status, body })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_method_default_is_put() {
        assert_eq!(Method::default(), Method::Put);
        assert_eq!(Method::Get.to_string(), "GET");
    }

    #[test]
    fn test_method_into_reqwest() {
        assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::new(201, r#"{"result":"ok"}"#);
        assert_eq!(response.json().unwrap(), json!({"result": "ok"}));
    }

    #[test]
    fn test_response_json_rejects_text() {
        let response = HttpResponse::new(200, "OK");
        assert!(response.json().is_err());
        assert_eq!(response.text(), "OK");
    }

    #[tokio::test]
    async fn test_reqwest_refused_connection_is_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = ReqwestTransport::new();
        let err = transport
            .request(
                Method::Get,
                &format!("http://127.0.0.1:{port}/state/status"),
                None,
                Duration::from_secs(2),
            )
            .await
            .unwrap_err();

        assert!(err.is_connection_error());
    }
}
