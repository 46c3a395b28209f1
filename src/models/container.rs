//! Container data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::blob::{LeaseState, LeaseStatus};

/// Public access level for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PublicAccessLevel {
    #[default]
    None,
    Container,
    Blob,
}

impl PublicAccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicAccessLevel::None => "",
            PublicAccessLevel::Container => "container",
            PublicAccessLevel::Blob => "blob",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" | "private" => Some(PublicAccessLevel::None),
            "container" => Some(PublicAccessLevel::Container),
            "blob" => Some(PublicAccessLevel::Blob),
            _ => None,
        }
    }
}

/// Container properties, from response headers or a listing entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerProperties {
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub lease_state: LeaseState,
    pub lease_status: LeaseStatus,
    pub public_access: PublicAccessLevel,
    pub has_immutability_policy: bool,
    pub has_legal_hold: bool,
    pub metadata: HashMap<String, String>,
}

/// One entry of a container listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerItem {
    pub name: String,
    pub properties: ContainerProperties,
}

/// One page of a container listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerList {
    pub prefix: Option<String>,
    pub marker: Option<String>,
    pub max_results: Option<u32>,
    pub containers: Vec<ContainerItem>,
    /// Continuation token for the next page, if there is one.
    pub next_marker: Option<String>,
}
