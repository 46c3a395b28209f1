//! Shared Key authorization for outgoing requests.

mod shared_key;
mod table;

pub use shared_key::compute_signature;

use http::header::AUTHORIZATION;

use crate::config::AccountSettings;
use crate::context::{header_value, RequestContext};
use crate::error::StorageResult;
use crate::request::ServiceType;

/// Authorization scheme used to sign requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    #[default]
    SharedKey,
    SharedKeyLite,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::SharedKey => "SharedKey",
            AuthScheme::SharedKeyLite => "SharedKeyLite",
        }
    }
}

/// Builds the string-to-sign for a request under the given scheme.
///
/// Blob and Queue requests share one canonicalization; Table requests use
/// their own.
pub fn string_to_sign(ctx: &RequestContext, scheme: AuthScheme) -> String {
    match (ctx.service, scheme) {
        (ServiceType::Table, AuthScheme::SharedKey) => table::string_to_sign(ctx),
        (ServiceType::Table, AuthScheme::SharedKeyLite) => table::string_to_sign_lite(ctx),
        (_, AuthScheme::SharedKey) => shared_key::string_to_sign(ctx),
        (_, AuthScheme::SharedKeyLite) => shared_key::string_to_sign_lite(ctx),
    }
}

/// Computes the Authorization header value for a request.
pub fn authorization(ctx: &RequestContext, settings: &AccountSettings) -> StorageResult<String> {
    let scheme = settings.auth_scheme();
    let string_to_sign = string_to_sign(ctx, scheme);
    let signature = compute_signature(&string_to_sign, settings.account_key())?;

    tracing::trace!("StringToSign (escaped): {:?}", string_to_sign);

    Ok(format!(
        "{} {}:{}",
        scheme.as_str(),
        settings.account_name(),
        signature
    ))
}

/// Signs a built request in place. Must run after every other header is set.
pub fn sign(ctx: &mut RequestContext, settings: &AccountSettings) -> StorageResult<()> {
    let mut value = header_value("authorization", &authorization(ctx, settings)?)?;
    value.set_sensitive(true);
    ctx.headers.insert(AUTHORIZATION, value);
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use bytes::Bytes;
    use http::{HeaderMap, Method};

    use crate::context::RequestContext;
    use crate::request::ServiceType;
    use crate::uri::RequestUri;

    pub const DATE: &str = "Mon, 01 Jan 2024 00:00:00 GMT";

    /// A request against the emulator endpoint with fixed date and version.
    pub fn context(service: ServiceType, method: Method, uri: RequestUri) -> RequestContext {
        let mut ctx = RequestContext {
            service,
            method,
            url: uri.to_url().unwrap(),
            account: "devstoreaccount1".to_string(),
            query_params: uri.parameters().clone(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_request_id: String::new(),
        };
        ctx.set_header("x-ms-date", DATE).unwrap();
        ctx.set_header("x-ms-version", "2021-10-04").unwrap();
        ctx.set_header("content-length", "0").unwrap();
        ctx
    }
}
