//! Shared Key canonicalization for the Blob and Queue services.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use http::Method;
use sha2::Sha256;

use crate::context::RequestContext;
use crate::error::{StorageError, StorageResult};

type HmacSha256 = Hmac<Sha256>;

/// Builds the string-to-sign for SharedKey authentication.
///
/// ```text
/// VERB \n Content-Encoding \n Content-Language \n Content-Length \n
/// Content-MD5 \n Content-Type \n Date \n If-Modified-Since \n If-Match \n
/// If-None-Match \n If-Unmodified-Since \n Range \n
/// CanonicalizedHeaders \n CanonicalizedResource
/// ```
pub(crate) fn string_to_sign(ctx: &RequestContext) -> String {
    let mut parts = Vec::with_capacity(14);

    // VERB
    parts.push(ctx.method.as_str().to_uppercase());

    parts.push(ctx.header("content-encoding").unwrap_or("").to_string());
    parts.push(ctx.header("content-language").unwrap_or("").to_string());
    parts.push(content_length(ctx));
    parts.push(ctx.header("content-md5").unwrap_or("").to_string());
    parts.push(ctx.content_type().unwrap_or("").to_string());

    // Date always travels as x-ms-date, which is part of the canonicalized headers.
    parts.push(String::new());

    for header in [
        "if-modified-since",
        "if-match",
        "if-none-match",
        "if-unmodified-since",
        "range",
    ] {
        parts.push(ctx.header(header).unwrap_or("").to_string());
    }

    parts.push(canonicalized_headers(ctx));
    parts.push(canonicalized_resource(ctx));

    parts.join("\n")
}

/// Builds the string-to-sign for SharedKeyLite authentication.
pub(crate) fn string_to_sign_lite(ctx: &RequestContext) -> String {
    [
        ctx.method.as_str().to_uppercase(),
        ctx.header("content-md5").unwrap_or("").to_string(),
        ctx.content_type().unwrap_or("").to_string(),
        String::new(),
        canonicalized_headers(ctx),
        canonicalized_resource_lite(ctx),
    ]
    .join("\n")
}

/// Content-Length is only signed for methods that carry a body, and is an
/// empty string when zero.
fn content_length(ctx: &RequestContext) -> String {
    let carries_body = ctx.method == Method::POST
        || ctx.method == Method::PUT
        || ctx.method == Method::DELETE;

    match ctx.content_length() {
        Some(len) if carries_body && len > 0 => len.to_string(),
        _ => String::new(),
    }
}

/// Sorted `name:value` lines for every x-ms-* header, joined with `\n`.
pub(crate) fn canonicalized_headers(ctx: &RequestContext) -> String {
    ctx.ms_headers()
        .into_iter()
        .map(|(name, value)| {
            let value = value.replace(['\r', '\n'], " ");
            format!("{}:{}", name, value.trim_start())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `/{account}{path}` followed by one `key:value` line per query parameter,
/// sorted by lower-cased key.
fn canonicalized_resource(ctx: &RequestContext) -> String {
    let mut resource = format!("/{}{}", ctx.account, ctx.url.path());

    let mut sorted_params: Vec<_> = ctx
        .query_params
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.as_str()))
        .collect();
    sorted_params.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, value) in sorted_params {
        resource.push('\n');
        resource.push_str(&key);
        resource.push(':');
        resource.push_str(value);
    }

    resource.trim_end_matches('\n').to_string()
}

/// `/{account}{path}`, plus `?comp=` when the request has a comp parameter.
pub(crate) fn canonicalized_resource_lite(ctx: &RequestContext) -> String {
    let mut resource = format!("/{}{}", ctx.account, ctx.url.path());

    if let Some(comp) = ctx.query_param("comp") {
        resource.push_str("?comp=");
        resource.push_str(comp);
    }

    resource
}

/// Computes the base64 HMAC-SHA256 of a string-to-sign.
pub fn compute_signature(string_to_sign: &str, account_key: &[u8]) -> StorageResult<String> {
    let mut mac = HmacSha256::new_from_slice(account_key)
        .map_err(|e| StorageError::general_with("failed to create HMAC", e.to_string()))?;

    mac.update(string_to_sign.as_bytes());
    let result = mac.finalize();

    Ok(BASE64.encode(result.into_bytes()))
}
