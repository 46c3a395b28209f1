//! Shared Key canonicalization for the Table service.
//!
//! The Table service signs neither the x-ms-* headers nor the query string
//! (other than `comp`), and takes the request date from `x-ms-date`.

use crate::context::RequestContext;

use super::shared_key::canonicalized_resource_lite;

/// `VERB \n Content-MD5 \n Content-Type \n Date \n CanonicalizedResource`
pub(crate) fn string_to_sign(ctx: &RequestContext) -> String {
    [
        ctx.method.as_str().to_uppercase(),
        ctx.header("content-md5").unwrap_or("").to_string(),
        ctx.content_type().unwrap_or("").to_string(),
        request_date(ctx).to_string(),
        canonicalized_resource_lite(ctx),
    ]
    .join("\n")
}

/// `Date \n CanonicalizedResource`
pub(crate) fn string_to_sign_lite(ctx: &RequestContext) -> String {
    format!("{}\n{}", request_date(ctx), canonicalized_resource_lite(ctx))
}

fn request_date(ctx: &RequestContext) -> &str {
    ctx.header("x-ms-date")
        .or_else(|| ctx.header("date"))
        .unwrap_or("")
}
