//! Blob operations.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use http::{HeaderMap, Method};
use md5::{Digest, Md5};
use std::collections::HashMap;

use super::{header_date, header_flag, header_string, service_uri, set_header};
use crate::config::AccountSettings;
use crate::error::StorageResult;
use crate::metadata;
use crate::models::{BlobContent, BlobProperties, BlobType, BlobWriteResult, LeaseState, LeaseStatus};
use crate::request::{Operation, ResponsePayload, ServiceType};
use crate::uri::RequestUri;

fn blob_uri(settings: &AccountSettings, container: &str, blob: &str) -> RequestUri {
    service_uri(settings, ServiceType::Blob)
        .segment(container)
        .segment(blob)
}

impl ResponsePayload for BlobProperties {
    fn from_headers(headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self {
            blob_type: header_string(headers, "x-ms-blob-type").and_then(|v| BlobType::from_str(&v)),
            content_length: header_string(headers, "content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            content_type: header_string(headers, "content-type"),
            content_encoding: header_string(headers, "content-encoding"),
            content_language: header_string(headers, "content-language"),
            content_md5: header_string(headers, "content-md5"),
            cache_control: header_string(headers, "cache-control"),
            etag: header_string(headers, "etag"),
            last_modified: header_date(headers, "last-modified"),
            lease_state: header_string(headers, "x-ms-lease-state")
                .and_then(|v| LeaseState::from_str(&v))
                .unwrap_or_default(),
            lease_status: header_string(headers, "x-ms-lease-status")
                .and_then(|v| LeaseStatus::from_str(&v))
                .unwrap_or_default(),
            metadata: metadata::extract(headers),
        })
    }
}

impl ResponsePayload for BlobContent {
    const EXPECTS_BODY: bool = true;

    fn from_headers(headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self {
            properties: BlobProperties::from_headers(headers)?,
            data: Bytes::new(),
        })
    }

    fn parse_body(&mut self, body: Bytes) -> StorageResult<()> {
        self.data = body;
        Ok(())
    }
}

impl ResponsePayload for BlobWriteResult {
    fn from_headers(headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self {
            etag: header_string(headers, "etag"),
            last_modified: header_date(headers, "last-modified"),
            content_md5: header_string(headers, "content-md5"),
            request_server_encrypted: header_flag(headers, "x-ms-request-server-encrypted"),
        })
    }
}

/// Uploads a block blob in a single request.
///
/// The body's MD5 is sent as `Content-MD5` so the service rejects a
/// corrupted upload.
#[derive(Debug, Clone)]
pub struct PutBlockBlob {
    pub container: String,
    pub blob: String,
    pub data: Bytes,
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl PutBlockBlob {
    pub fn new(container: impl Into<String>, blob: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
            data: data.into(),
            content_type: None,
            metadata: HashMap::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn content_md5(&self) -> String {
        BASE64.encode(Md5::digest(&self.data))
    }
}

impl Operation for PutBlockBlob {
    type Payload = BlobWriteResult;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        blob_uri(settings, &self.container, &self.blob)
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        set_header(headers, "x-ms-blob-type", BlobType::BlockBlob.as_str())?;
        set_header(headers, "content-md5", &self.content_md5())
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        if let Some(content_type) = &self.content_type {
            set_header(headers, "content-type", content_type)?;
        }
        metadata::apply(headers, &self.metadata)
    }

    fn body(&self) -> StorageResult<Option<Bytes>> {
        Ok(Some(self.data.clone()))
    }
}

/// Downloads a blob, or a byte range of it.
#[derive(Debug, Clone)]
pub struct GetBlob {
    pub container: String,
    pub blob: String,
    /// Inclusive start and optional inclusive end offset.
    pub range: Option<(u64, Option<u64>)>,
}

impl GetBlob {
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
            range: None,
        }
    }

    pub fn range(mut self, start: u64, end: Option<u64>) -> Self {
        self.range = Some((start, end));
        self
    }
}

impl Operation for GetBlob {
    type Payload = BlobContent;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        blob_uri(settings, &self.container, &self.blob)
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        match self.range {
            Some((start, Some(end))) => set_header(headers, "x-ms-range", &format!("bytes={}-{}", start, end)),
            Some((start, None)) => set_header(headers, "x-ms-range", &format!("bytes={}-", start)),
            None => Ok(()),
        }
    }
}

/// Reads a blob's properties and metadata without its content.
#[derive(Debug, Clone)]
pub struct GetBlobProperties {
    pub container: String,
    pub blob: String,
}

impl GetBlobProperties {
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
        }
    }
}

impl Operation for GetBlobProperties {
    type Payload = BlobProperties;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::HEAD
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        blob_uri(settings, &self.container, &self.blob)
    }
}

/// What to do with a blob's snapshots when deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSnapshots {
    /// Delete the blob and all its snapshots.
    Include,
    /// Delete only the snapshots.
    Only,
}

impl DeleteSnapshots {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteSnapshots::Include => "include",
            DeleteSnapshots::Only => "only",
        }
    }
}

/// Deletes a blob.
#[derive(Debug, Clone)]
pub struct DeleteBlob {
    pub container: String,
    pub blob: String,
    pub delete_snapshots: Option<DeleteSnapshots>,
}

impl DeleteBlob {
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blob: blob.into(),
            delete_snapshots: None,
        }
    }

    pub fn delete_snapshots(mut self, option: DeleteSnapshots) -> Self {
        self.delete_snapshots = Some(option);
        self
    }
}

impl Operation for DeleteBlob {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        blob_uri(settings, &self.container, &self.blob)
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        if let Some(option) = self.delete_snapshots {
            set_header(headers, "x-ms-delete-snapshots", option.as_str())?;
        }
        Ok(())
    }
}
