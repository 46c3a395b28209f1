//! The wire request built for one attempt, plus header and date helpers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{header::HeaderMap, HeaderName, HeaderValue, Method};
use std::collections::BTreeMap;
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::request::ServiceType;

/// A fully built request, ready to be signed and sent.
///
/// Built fresh for every attempt so that `x-ms-date` and the signature always
/// reflect the time the attempt was made.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Service the request is addressed to.
    pub service: ServiceType,
    /// HTTP method.
    pub method: Method,
    /// Request URL, with path and query encoded.
    pub url: Url,
    /// Account name the request is signed for.
    pub account: String,
    /// Query parameters as given by the operation, not percent-encoded.
    pub query_params: BTreeMap<String, String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body. Empty when the operation sends none.
    pub body: Bytes,
    /// Value of the `x-ms-client-request-id` header.
    pub client_request_id: String,
}

impl RequestContext {
    /// Returns the value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Returns the value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_str(&self.headers, name)
    }

    /// Sets a header, rejecting values that cannot be sent on the wire.
    pub fn set_header(&mut self, name: &'static str, value: &str) -> StorageResult<()> {
        self.headers
            .insert(HeaderName::from_static(name), header_value(name, value)?);
        Ok(())
    }

    /// Returns the x-ms-* headers with lower-cased names, sorted by name.
    pub fn ms_headers(&self) -> Vec<(String, &str)> {
        let mut headers: Vec<_> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let name_str = name.as_str().to_lowercase();
                if name_str.starts_with("x-ms-") {
                    value.to_str().ok().map(|v| (name_str, v))
                } else {
                    None
                }
            })
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));
        headers
    }

    /// Returns the Content-Length header value.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.parse().ok())
    }

    /// Returns the Content-Type header value.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Converts the context into the request handed to the transport.
    pub fn to_http_request(&self) -> StorageResult<http::Request<Bytes>> {
        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .body(self.body.clone())
            .map_err(|e| StorageError::general_with("failed to build HTTP request", e))?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }
}

/// Returns the value of a header as a string, if it is valid UTF-8.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parses a header value, naming the header in the error.
pub fn header_value(name: &str, value: &str) -> StorageResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| StorageError::general_with(format!("invalid value for header '{}'", name), e))
}

/// Parses an HTTP date in RFC 1123 format.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%a, %d %b %Y %H:%M:%S GMT")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

/// Formats a DateTime as RFC 1123 format for HTTP headers.
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
