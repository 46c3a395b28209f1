//! Common test utilities.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::net::TcpListener;

use azure_rest::{
    AccountSettings, Backoff, ErrorCode, RetryPolicy, ServiceType, StorageClient,
    DEFAULT_ACCOUNT, DEFAULT_ACCOUNT_KEY,
};

/// Installs a test subscriber once; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A canned response the mock server replays.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// An XML `<Error>` response the way the storage service sends it.
    pub fn error(code: ErrorCode) -> Self {
        Self::error_with(code.status_code(), code.as_str(), code.default_message())
    }

    pub fn error_with(status: StatusCode, code: &str, message: &str) -> Self {
        let body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><Error><Code>{}</Code><Message>{}</Message></Error>"#,
            code, message
        );
        Self::new(status)
            .header("content-type", "application/xml")
            .header("x-ms-error-code", code)
            .body(body)
    }

    /// A Table service JSON error response.
    pub fn table_error(status: StatusCode, code: &str, message: &str) -> Self {
        let body = serde_json::json!({
            "odata.error": {
                "code": code,
                "message": { "lang": "en-US", "value": message }
            }
        });
        Self::new(status)
            .header("content-type", "application/json;odata=nometadata")
            .body(body.to_string())
    }
}

/// A request as the mock server received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Percent-encoded path.
    pub path: String,
    /// Decoded query parameters.
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct MockState {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process storage endpoint with scripted responses.
///
/// Requests are answered in order from the script; once it runs dry every
/// request gets an empty 200.
pub struct MockServer {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    /// Starts a mock server on a random port.
    pub async fn start() -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(MockState::default());

        let app = Router::new().fallback(handle).with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    pub fn enqueue(&self, response: MockResponse) {
        self.state.responses.lock().push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request was received")
    }

    /// Development account with every service pointed at this server.
    pub fn settings(&self) -> AccountSettings {
        let endpoint = format!("{}/{}", self.base_url, DEFAULT_ACCOUNT);
        AccountSettings::development()
            .with_endpoint(ServiceType::Blob, &endpoint)
            .unwrap()
            .with_endpoint(ServiceType::Queue, &endpoint)
            .unwrap()
            .with_endpoint(ServiceType::Table, &endpoint)
            .unwrap()
    }

    /// Client against this server that retries without waiting.
    pub fn client(&self, max_retries: u32) -> StorageClient {
        StorageClient::builder(self.settings())
            .retry_policy(RetryPolicy::new(max_retries, Backoff::None))
            .build()
    }
}

async fn handle(State(state): State<Arc<MockState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();

    let query = parts
        .uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    state.requests.lock().push(RecordedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query,
        headers: parts.headers,
        body,
    });

    let scripted = state.responses.lock().pop_front();
    let scripted = scripted.unwrap_or_else(MockResponse::ok);

    let mut builder = Response::builder()
        .status(scripted.status)
        .header("x-ms-request-id", uuid::Uuid::new_v4().to_string())
        .header("x-ms-version", azure_rest::API_VERSION);
    for (name, value) in &scripted.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(Body::from(scripted.body)).unwrap()
}

fn hmac_base64(string_to_sign: &str) -> String {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let key_bytes = BASE64.decode(DEFAULT_ACCOUNT_KEY).unwrap();
    let mut mac = HmacSha256::new_from_slice(&key_bytes).unwrap();
    mac.update(string_to_sign.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Recomputes the Blob/Queue SharedKey Authorization header for a received
/// request, for the development account.
pub fn expected_shared_key(request: &RecordedRequest) -> String {
    let header = |name: &str| request.header(name).unwrap_or("").to_string();

    let mut ms_headers: Vec<_> = request
        .headers
        .iter()
        .filter(|(k, _)| k.as_str().starts_with("x-ms-"))
        .map(|(k, v)| (k.as_str().to_lowercase(), v.to_str().unwrap().to_string()))
        .collect();
    ms_headers.sort_by(|a, b| a.0.cmp(&b.0));

    let canonicalized_headers: String = ms_headers
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join("\n");

    let mut params: Vec<_> = request
        .query
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();
    params.sort();
    let mut canonicalized_resource = format!("/{}{}", DEFAULT_ACCOUNT, request.path);
    for (k, v) in params {
        canonicalized_resource.push_str(&format!("\n{}:{}", k, v));
    }

    let content_length = match request.method {
        Method::PUT | Method::POST | Method::DELETE => header("content-length"),
        _ => String::new(),
    };
    let content_length = if content_length == "0" {
        String::new()
    } else {
        content_length
    };

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n\n{}\n{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        header("content-encoding"),
        header("content-language"),
        content_length,
        header("content-md5"),
        header("content-type"),
        header("if-modified-since"),
        header("if-match"),
        header("if-none-match"),
        header("if-unmodified-since"),
        header("range"),
        canonicalized_headers,
        canonicalized_resource
    );

    format!("SharedKey {}:{}", DEFAULT_ACCOUNT, hmac_base64(&string_to_sign))
}

/// Recomputes the Table SharedKey Authorization header for a received
/// request, for the development account.
pub fn expected_table_shared_key(request: &RecordedRequest) -> String {
    let header = |name: &str| request.header(name).unwrap_or("").to_string();

    let mut canonicalized_resource = format!("/{}{}", DEFAULT_ACCOUNT, request.path);
    if let Some(comp) = request.query_param("comp") {
        canonicalized_resource.push_str(&format!("?comp={}", comp));
    }

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}\n{}",
        request.method,
        header("content-md5"),
        header("content-type"),
        header("x-ms-date"),
        canonicalized_resource
    );

    format!("SharedKey {}:{}", DEFAULT_ACCOUNT, hmac_base64(&string_to_sign))
}

/// A port nothing listens on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
