//! Pluggable HTTP transport.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::error::TransportError;

/// Sends one HTTP request and returns the full response.
///
/// Implementations must read the response body to the end before returning
/// so the connection can be reused. Non-success statuses are responses, not
/// errors; an `Err` means no response was received.
#[async_trait]
pub trait HttpTransport: Debug + Send + Sync + 'static {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError>;
}

/// [`HttpTransport`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: http::Request<Bytes>) -> Result<http::Response<Bytes>, TransportError> {
        let (parts, body) = request.into_parts();

        let response = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut result = http::Response::new(body);
        *result.status_mut() = status;
        *result.version_mut() = version;
        *result.headers_mut() = headers;
        Ok(result)
    }
}
