//! Blob data models.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Blob types supported by Azure Blob Storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobType {
    BlockBlob,
    PageBlob,
    AppendBlob,
}

impl BlobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobType::BlockBlob => "BlockBlob",
            BlobType::PageBlob => "PageBlob",
            BlobType::AppendBlob => "AppendBlob",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BlockBlob" => Some(BlobType::BlockBlob),
            "PageBlob" => Some(BlobType::PageBlob),
            "AppendBlob" => Some(BlobType::AppendBlob),
            _ => None,
        }
    }
}

/// Lease state for containers and blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LeaseState {
    #[default]
    Available,
    Leased,
    Expired,
    Breaking,
    Broken,
}

impl LeaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseState::Available => "available",
            LeaseState::Leased => "leased",
            LeaseState::Expired => "expired",
            LeaseState::Breaking => "breaking",
            LeaseState::Broken => "broken",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(LeaseState::Available),
            "leased" => Some(LeaseState::Leased),
            "expired" => Some(LeaseState::Expired),
            "breaking" => Some(LeaseState::Breaking),
            "broken" => Some(LeaseState::Broken),
            _ => None,
        }
    }
}

/// Lease status for containers and blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LeaseStatus {
    #[default]
    Unlocked,
    Locked,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Unlocked => "unlocked",
            LeaseStatus::Locked => "locked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unlocked" => Some(LeaseStatus::Unlocked),
            "locked" => Some(LeaseStatus::Locked),
            _ => None,
        }
    }
}

/// Blob properties as returned in response headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobProperties {
    pub blob_type: Option<BlobType>,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_md5: Option<String>,
    pub cache_control: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub lease_state: LeaseState,
    pub lease_status: LeaseStatus,
    pub metadata: HashMap<String, String>,
}

/// A downloaded blob.
#[derive(Debug, Clone, Default)]
pub struct BlobContent {
    pub properties: BlobProperties,
    pub data: Bytes,
}

/// Headers returned when a blob is written.
#[derive(Debug, Clone, Default)]
pub struct BlobWriteResult {
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_md5: Option<String>,
    pub request_server_encrypted: bool,
}
