//! Account settings and client-wide constants.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::HashMap;
use std::fmt;
use url::Url;

use crate::auth::AuthScheme;
use crate::error::{StorageError, StorageResult};
use crate::request::ServiceType;

/// Storage REST API version sent in `x-ms-version` on every request.
pub const API_VERSION: &str = "2021-10-04";

/// Default account name for development storage.
pub const DEFAULT_ACCOUNT: &str = "devstoreaccount1";

/// Default account key for development storage (base64 encoded).
pub const DEFAULT_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Emulator ports for the blob, queue and table services.
pub const DEFAULT_BLOB_PORT: u16 = 10000;
pub const DEFAULT_QUEUE_PORT: u16 = 10001;
pub const DEFAULT_TABLE_PORT: u16 = 10002;

/// Endpoint suffix for the public Azure cloud.
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Transport protocol used for computed endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }
}

/// Credentials and endpoints for one storage account.
///
/// Settings are immutable once built and are shared by reference across
/// every request a client executes.
#[derive(Clone)]
pub struct AccountSettings {
    account_name: String,
    account_key: Vec<u8>,
    protocol: Protocol,
    endpoint_suffix: String,
    blob_endpoint: Option<Url>,
    queue_endpoint: Option<Url>,
    table_endpoint: Option<Url>,
    auth_scheme: AuthScheme,
}

impl AccountSettings {
    /// Creates settings for `account_name` with a base64 encoded key.
    pub fn new(account_name: impl Into<String>, account_key: &str) -> StorageResult<Self> {
        let account_name = account_name.into();
        validate_account_name(&account_name)?;

        let account_key = BASE64
            .decode(account_key.trim())
            .map_err(|_| StorageError::config("account key is not valid base64"))?;

        Ok(Self {
            account_name,
            account_key,
            protocol: Protocol::default(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            blob_endpoint: None,
            queue_endpoint: None,
            table_endpoint: None,
            auth_scheme: AuthScheme::default(),
        })
    }

    /// Settings for the local storage emulator.
    pub fn development() -> Self {
        let endpoint = |port: u16| {
            Url::parse(&format!("http://127.0.0.1:{}/{}", port, DEFAULT_ACCOUNT)).ok()
        };

        Self {
            account_name: DEFAULT_ACCOUNT.to_string(),
            account_key: BASE64.decode(DEFAULT_ACCOUNT_KEY).unwrap_or_default(),
            protocol: Protocol::Http,
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            blob_endpoint: endpoint(DEFAULT_BLOB_PORT),
            queue_endpoint: endpoint(DEFAULT_QUEUE_PORT),
            table_endpoint: endpoint(DEFAULT_TABLE_PORT),
            auth_scheme: AuthScheme::default(),
        }
    }

    /// Parses an Azure Storage connection string such as
    /// `DefaultEndpointsProtocol=https;AccountName=...;AccountKey=...`.
    pub fn from_connection_string(connection_string: &str) -> StorageResult<Self> {
        let pairs: HashMap<String, String> = connection_string
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                part.split_once('=')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .ok_or_else(|| {
                        StorageError::config(format!("malformed connection string segment '{}'", part))
                    })
            })
            .collect::<StorageResult<_>>()?;

        if pairs
            .get("UseDevelopmentStorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self::development());
        }

        let account = pairs
            .get("AccountName")
            .ok_or_else(|| StorageError::config("connection string is missing AccountName"))?;
        let key = pairs
            .get("AccountKey")
            .ok_or_else(|| StorageError::config("connection string is missing AccountKey"))?;

        let mut settings = Self::new(account.clone(), key)?;

        if let Some(protocol) = pairs.get("DefaultEndpointsProtocol") {
            settings.protocol = Protocol::from_str(protocol).ok_or_else(|| {
                StorageError::config(format!("unsupported protocol '{}'", protocol))
            })?;
        }
        if let Some(suffix) = pairs.get("EndpointSuffix") {
            settings.endpoint_suffix = suffix.clone();
        }

        for (key, service) in [
            ("BlobEndpoint", ServiceType::Blob),
            ("QueueEndpoint", ServiceType::Queue),
            ("TableEndpoint", ServiceType::Table),
        ] {
            if let Some(endpoint) = pairs.get(key) {
                settings = settings.with_endpoint(service, endpoint)?;
            }
        }

        Ok(settings)
    }

    /// Sets the protocol used for computed endpoints.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Overrides the endpoint of one service.
    pub fn with_endpoint(mut self, service: ServiceType, endpoint: &str) -> StorageResult<Self> {
        let url = Url::parse(endpoint.trim_end_matches('/')).map_err(|e| {
            StorageError::config(format!("invalid {} endpoint '{}': {}", service.as_str(), endpoint, e))
        })?;

        match service {
            ServiceType::Blob => self.blob_endpoint = Some(url),
            ServiceType::Queue => self.queue_endpoint = Some(url),
            ServiceType::Table => self.table_endpoint = Some(url),
        }
        Ok(self)
    }

    /// Selects the Authorization scheme used when signing.
    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Decoded account key bytes.
    pub fn account_key(&self) -> &[u8] {
        &self.account_key
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        self.auth_scheme
    }

    /// Returns the endpoint for a service, computing the public-cloud one
    /// unless it was overridden.
    pub fn endpoint(&self, service: ServiceType) -> String {
        let overridden = match service {
            ServiceType::Blob => self.blob_endpoint.as_ref(),
            ServiceType::Queue => self.queue_endpoint.as_ref(),
            ServiceType::Table => self.table_endpoint.as_ref(),
        };

        match overridden {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.{}.{}",
                self.protocol.as_str(),
                self.account_name,
                service.as_str(),
                self.endpoint_suffix
            ),
        }
    }
}

impl fmt::Debug for AccountSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSettings")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("protocol", &self.protocol)
            .field("blob_endpoint", &self.endpoint(ServiceType::Blob))
            .field("queue_endpoint", &self.endpoint(ServiceType::Queue))
            .field("table_endpoint", &self.endpoint(ServiceType::Table))
            .field("auth_scheme", &self.auth_scheme)
            .finish()
    }
}

/// Account names are 3-24 lowercase letters and digits.
fn validate_account_name(name: &str) -> StorageResult<()> {
    if name.len() < 3 || name.len() > 24 {
        return Err(StorageError::config(
            "account name must be between 3 and 24 characters",
        ));
    }

    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(StorageError::config(
            "account name can only contain lowercase letters and numbers",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_endpoints() {
        let settings = AccountSettings::new("myaccount", DEFAULT_ACCOUNT_KEY).unwrap();
        assert_eq!(
            settings.endpoint(ServiceType::Blob),
            "https://myaccount.blob.core.windows.net"
        );
        assert_eq!(
            settings.endpoint(ServiceType::Table),
            "https://myaccount.table.core.windows.net"
        );

        let settings = settings.with_protocol(Protocol::Http);
        assert_eq!(
            settings.endpoint(ServiceType::Queue),
            "http://myaccount.queue.core.windows.net"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let settings = AccountSettings::new("myaccount", DEFAULT_ACCOUNT_KEY)
            .unwrap()
            .with_endpoint(ServiceType::Queue, "http://localhost:8080/myaccount/")
            .unwrap();

        assert_eq!(settings.endpoint(ServiceType::Queue), "http://localhost:8080/myaccount");
        assert_eq!(
            settings.endpoint(ServiceType::Blob),
            "https://myaccount.blob.core.windows.net"
        );
    }

    #[test]
    fn test_invalid_settings() {
        assert!(AccountSettings::new("ab", DEFAULT_ACCOUNT_KEY).is_err());
        assert!(AccountSettings::new("MyAccount", DEFAULT_ACCOUNT_KEY).is_err());
        assert!(AccountSettings::new("myaccount", "not base64!").is_err());
    }

    #[test]
    fn test_development_settings() {
        let settings = AccountSettings::development();
        assert_eq!(settings.account_name(), DEFAULT_ACCOUNT);
        assert_eq!(settings.account_key().len(), 64);
        assert_eq!(
            settings.endpoint(ServiceType::Table),
            "http://127.0.0.1:10002/devstoreaccount1"
        );
    }

    #[test]
    fn test_connection_string() {
        let settings = AccountSettings::from_connection_string(&format!(
            "DefaultEndpointsProtocol=http;AccountName=devstoreaccount1;AccountKey={};BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1;",
            DEFAULT_ACCOUNT_KEY
        ))
        .unwrap();

        assert_eq!(settings.protocol(), Protocol::Http);
        assert_eq!(
            settings.endpoint(ServiceType::Blob),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert_eq!(
            settings.endpoint(ServiceType::Queue),
            "http://devstoreaccount1.queue.core.windows.net"
        );

        let dev = AccountSettings::from_connection_string("UseDevelopmentStorage=true").unwrap();
        assert_eq!(dev.account_name(), DEFAULT_ACCOUNT);

        assert!(AccountSettings::from_connection_string("AccountName=abc").is_err());
        assert!(AccountSettings::from_connection_string("garbage").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = AccountSettings::development();
        let printed = format!("{:?}", settings);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains(DEFAULT_ACCOUNT_KEY));
    }
}
