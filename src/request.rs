//! The contract between concrete operations and the execution pipeline.

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::config::AccountSettings;
use crate::error::StorageResult;
use crate::uri::RequestUri;

/// Storage service an operation talks to.
///
/// Picks the endpoint, the signing canonicalization and the error
/// classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Blob,
    Queue,
    Table,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Blob => "blob",
            ServiceType::Queue => "queue",
            ServiceType::Table => "table",
        }
    }
}

/// A single REST operation.
///
/// Implementors declare what to send; the pipeline adds the standard headers,
/// signs, sends, retries and parses the response into [`Operation::Payload`].
pub trait Operation: Send + Sync {
    /// What a successful response is parsed into.
    type Payload: ResponsePayload;

    fn service(&self) -> ServiceType;

    fn method(&self) -> Method;

    /// Builds the request URI against the settings' endpoint for
    /// [`Operation::service`].
    fn uri(&self, settings: &AccountSettings) -> RequestUri;

    /// Headers the operation cannot do without. Applied before
    /// [`Operation::optional_headers`].
    fn required_headers(&self, _headers: &mut HeaderMap) -> StorageResult<()> {
        Ok(())
    }

    /// Headers set only when the caller asked for them.
    fn optional_headers(&self, _headers: &mut HeaderMap) -> StorageResult<()> {
        Ok(())
    }

    /// Request body. Its length becomes the Content-Length; `None` sends
    /// `Content-Length: 0`. An error aborts the call before anything is sent.
    fn body(&self) -> StorageResult<Option<Bytes>> {
        Ok(None)
    }
}

/// Typed view of a successful response.
pub trait ResponsePayload: Sized + Send {
    /// Whether [`ResponsePayload::parse_body`] should be fed the body.
    /// When false the body is read and dropped.
    const EXPECTS_BODY: bool = false;

    /// Builds the payload from the response headers.
    fn from_headers(headers: &HeaderMap) -> StorageResult<Self>;

    /// Fills body-derived fields. Called only when `EXPECTS_BODY` is set.
    fn parse_body(&mut self, _body: Bytes) -> StorageResult<()> {
        Ok(())
    }
}

impl ResponsePayload for () {
    fn from_headers(_headers: &HeaderMap) -> StorageResult<Self> {
        Ok(())
    }
}

/// A successful response and how many attempts it took.
#[derive(Debug, Clone)]
pub struct Response<T> {
    status: StatusCode,
    request_id: Option<String>,
    payload: T,
    attempts: u32,
}

impl<T> Response<T> {
    pub(crate) fn new(status: StatusCode, request_id: Option<String>, payload: T) -> Self {
        Self {
            status,
            request_id,
            payload,
            attempts: 1,
        }
    }

    pub(crate) fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Value of the `x-ms-request-id` response header.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Number of attempts it took to get this response, at least 1.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
