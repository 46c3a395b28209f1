//! Container operations.

use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::HashMap;

use super::{header_date, header_flag, header_string, service_uri, set_header};
use crate::config::AccountSettings;
use crate::error::StorageResult;
use crate::metadata;
use crate::models::{ContainerList, ContainerProperties, LeaseState, LeaseStatus, PublicAccessLevel};
use crate::request::{Operation, ResponsePayload, ServiceType};
use crate::uri::RequestUri;
use crate::xml::parse_container_list;

fn container_uri(settings: &AccountSettings, name: &str) -> RequestUri {
    service_uri(settings, ServiceType::Blob)
        .segment(name)
        .parameter("restype", "container")
}

impl ResponsePayload for ContainerProperties {
    fn from_headers(headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self {
            etag: header_string(headers, "etag"),
            last_modified: header_date(headers, "last-modified"),
            lease_state: header_string(headers, "x-ms-lease-state")
                .and_then(|v| LeaseState::from_str(&v))
                .unwrap_or_default(),
            lease_status: header_string(headers, "x-ms-lease-status")
                .and_then(|v| LeaseStatus::from_str(&v))
                .unwrap_or_default(),
            public_access: header_string(headers, "x-ms-blob-public-access")
                .and_then(|v| PublicAccessLevel::from_str(&v))
                .unwrap_or_default(),
            has_immutability_policy: header_flag(headers, "x-ms-has-immutability-policy"),
            has_legal_hold: header_flag(headers, "x-ms-has-legal-hold"),
            metadata: metadata::extract(headers),
        })
    }
}

impl ResponsePayload for ContainerList {
    const EXPECTS_BODY: bool = true;

    fn from_headers(_headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self::default())
    }

    fn parse_body(&mut self, body: Bytes) -> StorageResult<()> {
        *self = parse_container_list(&String::from_utf8_lossy(&body))?;
        Ok(())
    }
}

/// Creates a container.
#[derive(Debug, Clone, Default)]
pub struct CreateContainer {
    pub name: String,
    pub public_access: Option<PublicAccessLevel>,
    pub metadata: HashMap<String, String>,
}

impl CreateContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn public_access(mut self, level: PublicAccessLevel) -> Self {
        self.public_access = Some(level);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Operation for CreateContainer {
    type Payload = ContainerProperties;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        container_uri(settings, &self.name)
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        match self.public_access {
            Some(PublicAccessLevel::None) | None => {}
            Some(level) => set_header(headers, "x-ms-blob-public-access", level.as_str())?,
        }
        metadata::apply(headers, &self.metadata)
    }
}

/// Deletes a container.
#[derive(Debug, Clone)]
pub struct DeleteContainer {
    pub name: String,
    pub lease_id: Option<String>,
}

impl DeleteContainer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lease_id: None,
        }
    }

    pub fn lease_id(mut self, lease_id: impl Into<String>) -> Self {
        self.lease_id = Some(lease_id.into());
        self
    }
}

impl Operation for DeleteContainer {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        container_uri(settings, &self.name)
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        if let Some(lease_id) = &self.lease_id {
            set_header(headers, "x-ms-lease-id", lease_id)?;
        }
        Ok(())
    }
}

/// Reads a container's properties and metadata.
#[derive(Debug, Clone)]
pub struct GetContainerProperties {
    pub name: String,
}

impl GetContainerProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for GetContainerProperties {
    type Payload = ContainerProperties;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        container_uri(settings, &self.name)
    }
}

/// Lists the containers of the account, one page at a time.
#[derive(Debug, Clone, Default)]
pub struct ListContainers {
    pub prefix: Option<String>,
    pub marker: Option<String>,
    pub max_results: Option<u32>,
    pub include_metadata: bool,
}

impl ListContainers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Continues from the `next_marker` of a previous page.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn include_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

impl Operation for ListContainers {
    type Payload = ContainerList;

    fn service(&self) -> ServiceType {
        ServiceType::Blob
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Blob)
            .parameter("comp", "list")
            .optional_parameter("prefix", self.prefix.as_ref())
            .optional_parameter("marker", self.marker.as_ref())
            .optional_parameter("maxresults", self.max_results)
            .optional_parameter("include", self.include_metadata.then_some("metadata"))
    }
}
