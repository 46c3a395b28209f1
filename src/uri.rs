//! Request URI assembly from an endpoint, path segments and query parameters.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Characters left as-is in path segments. `/` stays so blob names can carry
/// virtual directories; `'`, `(` and `)` stay for Table addressing such as
/// `Tables('name')`.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b',')
    .remove(b'=')
    .remove(b'$');

/// Characters left as-is in query parameter keys and values.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builder for the URI of one operation.
///
/// Parameters live in a sorted map, so the same set of parameters always
/// renders to the same URI no matter the order they were added in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri {
    base: String,
    segments: Vec<String>,
    parameters: BTreeMap<String, String>,
}

impl RequestUri {
    /// Starts a URI at a service endpoint.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            segments: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Appends a path segment. Surrounding slashes are trimmed; empty
    /// segments are skipped.
    pub fn segment(mut self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref().trim_matches('/');
        if !segment.is_empty() {
            self.segments.push(segment.to_string());
        }
        self
    }

    /// Adds a query parameter, replacing any previous value for the key.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Adds a query parameter when a value is present.
    pub fn optional_parameter(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.parameter(key, value.to_string()),
            None => self,
        }
    }

    /// Path segments in the order they were added.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Query parameters, not percent-encoded.
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Renders `base/segment/...?key=value&...`, percent-encoding segments,
    /// keys and values.
    pub fn uri_string(&self) -> String {
        let mut uri = self.base.clone();

        if !self.segments.is_empty() {
            uri.push('/');
            let path = self
                .segments
                .iter()
                .map(|s| utf8_percent_encode(s, PATH_ENCODE_SET).to_string())
                .collect::<Vec<_>>()
                .join("/");
            uri.push_str(&path);
        }

        if !self.parameters.is_empty() {
            uri.push('?');
            let query = self
                .parameters
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(k, QUERY_ENCODE_SET),
                        utf8_percent_encode(v, QUERY_ENCODE_SET)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            uri.push_str(&query);
        }

        uri
    }

    /// Parses the rendered URI.
    pub fn to_url(&self) -> StorageResult<Url> {
        let uri = self.uri_string();
        Url::parse(&uri).map_err(|e| StorageError::config(format!("invalid request URI '{}': {}", uri, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_trimmed_and_joined() {
        let uri = RequestUri::new("http://127.0.0.1:10001/test/")
            .segment("queue.abc")
            .segment("whatever/");

        assert_eq!(uri.uri_string(), "http://127.0.0.1:10001/test/queue.abc/whatever");
        assert_eq!(uri.segments(), ["queue.abc", "whatever"]);
    }

    #[test]
    fn test_parameters_order_independent() {
        let a = RequestUri::new("https://a.blob.core.windows.net")
            .segment("container")
            .parameter("restype", "container")
            .parameter("comp", "list");
        let b = RequestUri::new("https://a.blob.core.windows.net")
            .segment("container")
            .parameter("comp", "list")
            .parameter("restype", "container");

        assert_eq!(a.uri_string(), b.uri_string());
        assert_eq!(
            a.uri_string(),
            "https://a.blob.core.windows.net/container?comp=list&restype=container"
        );
    }

    #[test]
    fn test_reserved_characters_encoded() {
        let uri = RequestUri::new("https://a.blob.core.windows.net")
            .segment("container")
            .segment("dir/my file.txt")
            .parameter("prefix", "a&b=c d");

        assert_eq!(
            uri.uri_string(),
            "https://a.blob.core.windows.net/container/dir/my%20file.txt?prefix=a%26b%3Dc%20d"
        );
        assert_eq!(uri.parameters()["prefix"], "a&b=c d");

        let url = uri.to_url().unwrap();
        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs[0].1, "a&b=c d");
    }

    #[test]
    fn test_table_addressing_kept_readable() {
        let uri = RequestUri::new("https://a.table.core.windows.net")
            .segment("people(PartitionKey='p1',RowKey='r1')");
        assert_eq!(
            uri.to_url().unwrap().path(),
            "/people(PartitionKey='p1',RowKey='r1')"
        );
    }

    #[test]
    fn test_optional_parameter() {
        let uri = RequestUri::new("https://a.queue.core.windows.net")
            .optional_parameter("numofmessages", Some(5))
            .optional_parameter("visibilitytimeout", None::<u32>);

        assert_eq!(uri.uri_string(), "https://a.queue.core.windows.net?numofmessages=5");
    }
}
