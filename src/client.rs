//! Execution pipeline: builds, signs, sends and retries operations.

use bytes::Bytes;
use chrono::Utc;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::HeaderValue;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth;
use crate::classify::classify_response;
use crate::config::{AccountSettings, API_VERSION};
use crate::context::{format_http_date, header_str, header_value, RequestContext};
use crate::error::{StorageError, StorageResult};
use crate::request::{Operation, Response, ResponsePayload};
use crate::retry::RetryPolicy;
use crate::transport::{HttpTransport, ReqwestTransport};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("azure-rest-rs/", env!("CARGO_PKG_VERSION"));

/// Executes operations against one storage account.
///
/// Cheap to clone; clones share the settings and the transport.
#[derive(Debug, Clone)]
pub struct StorageClient {
    settings: Arc<AccountSettings>,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    user_agent: String,
}

impl StorageClient {
    /// Creates a client with the default transport and retry policy.
    pub fn new(settings: AccountSettings) -> Self {
        Self::builder(settings).build()
    }

    pub fn builder(settings: AccountSettings) -> StorageClientBuilder {
        StorageClientBuilder::new(settings)
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Builds and signs the wire request for one attempt.
    ///
    /// Standard headers go first, then the operation's required and optional
    /// headers; the Authorization header is computed last over the result.
    pub fn build_request<O: Operation>(&self, op: &O) -> StorageResult<RequestContext> {
        let uri = op.uri(&self.settings);
        let url = uri.to_url()?;
        let body = op.body()?.unwrap_or_default();
        let timestamp = Utc::now();
        let client_request_id = Uuid::new_v4().to_string();

        let mut ctx = RequestContext {
            service: op.service(),
            method: op.method(),
            url,
            account: self.settings.account_name().to_string(),
            query_params: uri.parameters().clone(),
            headers: http::HeaderMap::new(),
            body,
            client_request_id: client_request_id.clone(),
        };

        ctx.headers
            .insert(CONTENT_LENGTH, HeaderValue::from(ctx.body.len()));
        ctx.headers
            .insert(USER_AGENT, header_value("user-agent", &self.user_agent)?);
        ctx.set_header("x-ms-version", API_VERSION)?;
        ctx.set_header("x-ms-date", &format_http_date(&timestamp))?;
        ctx.set_header("x-ms-client-request-id", &client_request_id)?;

        op.required_headers(&mut ctx.headers)?;
        op.optional_headers(&mut ctx.headers)?;

        auth::sign(&mut ctx, &self.settings)?;

        Ok(ctx)
    }

    /// Executes an operation under the client's retry policy.
    pub async fn execute<O: Operation>(&self, op: &O) -> StorageResult<Response<O::Payload>> {
        let (response, attempts) = self
            .retry
            .run(|attempt| self.send_once(op, attempt))
            .await?;

        Ok(response.with_attempts(attempts))
    }

    /// Blocking adapter over [`StorageClient::execute`].
    ///
    /// Runs the operation on a private current-thread runtime. Called from
    /// within a tokio runtime it fails without sending anything; use
    /// [`StorageClient::execute`] there.
    pub fn execute_blocking<O: Operation>(&self, op: &O) -> StorageResult<Response<O::Payload>> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(StorageError::general(
                "execute_blocking cannot be called from within an async runtime",
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::general_with("failed to start blocking runtime", e))?;

        runtime.block_on(self.execute(op))
    }

    async fn send_once<O: Operation>(
        &self,
        op: &O,
        attempt: u32,
    ) -> StorageResult<Response<O::Payload>> {
        let ctx = self.build_request(op)?;

        debug!(
            "Attempt {}: {} {} (client request id {})",
            attempt, ctx.method, ctx.url, ctx.client_request_id
        );

        let response = self
            .transport
            .send(ctx.to_http_request()?)
            .await
            .map_err(StorageError::Unidentified)?;

        let (parts, body) = response.into_parts();
        let request_id = header_str(&parts.headers, "x-ms-request-id").map(String::from);

        if !parts.status.is_success() {
            let error = classify_response(ctx.service, parts.status, &parts.headers, &body);
            debug!(
                "Attempt {} answered {} {}: {}",
                attempt, error.status, error.code, error.message
            );
            return Err(error.into());
        }

        let payload = parse_payload::<O::Payload>(&parts.headers, body)?;
        Ok(Response::new(parts.status, request_id, payload))
    }
}

fn parse_payload<P: ResponsePayload>(headers: &http::HeaderMap, body: Bytes) -> StorageResult<P> {
    let mut payload = P::from_headers(headers).map_err(into_general)?;
    if P::EXPECTS_BODY {
        payload.parse_body(body).map_err(into_general)?;
    }
    Ok(payload)
}

/// Payload parsing failures surface as general failures.
fn into_general(err: StorageError) -> StorageError {
    match err {
        StorageError::General { .. } => err,
        other => StorageError::general_with("failed to parse response", other),
    }
}

/// Builder for [`StorageClient`].
pub struct StorageClientBuilder {
    settings: AccountSettings,
    transport: Option<Arc<dyn HttpTransport>>,
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl StorageClientBuilder {
    pub fn new(settings: AccountSettings) -> Self {
        Self {
            settings,
            transport: None,
            retry: RetryPolicy::default(),
            user_agent: None,
        }
    }

    /// Sets the HTTP transport. Defaults to [`ReqwestTransport`].
    pub fn transport(mut self, transport: impl HttpTransport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> StorageClient {
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::default()));

        StorageClient {
            settings: Arc::new(self.settings),
            transport,
            retry: self.retry,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}
