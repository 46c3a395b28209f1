//! Operation descriptors for the Blob, Queue and Table services.

mod blob;
mod container;
mod queue;
mod table;

pub use blob::*;
pub use container::*;
pub use queue::*;
pub use table::*;

use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName};

use crate::config::AccountSettings;
use crate::context::{header_str, header_value, parse_http_date};
use crate::error::StorageResult;
use crate::request::ServiceType;
use crate::uri::RequestUri;

/// Starts a URI at the settings' endpoint for `service`.
fn service_uri(settings: &AccountSettings, service: ServiceType) -> RequestUri {
    RequestUri::new(settings.endpoint(service))
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> StorageResult<()> {
    headers.insert(HeaderName::from_static(name), header_value(name, value)?);
    Ok(())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, name).map(String::from)
}

fn header_date(headers: &HeaderMap, name: &str) -> Option<DateTime<Utc>> {
    header_str(headers, name).and_then(parse_http_date)
}

fn header_flag(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name).map_or(false, |v| v.eq_ignore_ascii_case("true"))
}
