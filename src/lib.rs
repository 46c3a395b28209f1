//! azure-rest-rs: a REST client core for Azure Blob, Queue and Table storage.
//!
//! Operations are small descriptors implementing [`Operation`]. A
//! [`StorageClient`] turns each into a signed HTTP request, sends it with
//! retries, and parses the response or classifies the error.
//!
//! # Example
//!
//! ```no_run
//! use azure_rest::operations::{GetMessages, PutMessage};
//! use azure_rest::{AccountSettings, StorageClient};
//!
//! #[tokio::main]
//! async fn main() -> azure_rest::StorageResult<()> {
//!     let client = StorageClient::new(AccountSettings::development());
//!
//!     client.execute(&PutMessage::new("jobs", "hello")).await?;
//!     let messages = client.execute(&GetMessages::new("jobs")).await?;
//!     for message in messages.payload() {
//!         println!("{:?}", message.message_text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod metadata;
pub mod models;
pub mod operations;
pub mod request;
pub mod retry;
pub mod transport;
pub mod uri;
pub mod xml;

// Re-exports for convenience
pub use auth::AuthScheme;
pub use client::{StorageClient, StorageClientBuilder};
pub use config::{AccountSettings, Protocol, API_VERSION, DEFAULT_ACCOUNT, DEFAULT_ACCOUNT_KEY};
pub use error::{AzureError, ErrorCode, StorageError, StorageResult};
pub use request::{Operation, Response, ResponsePayload, ServiceType};
pub use retry::{Backoff, RetryPolicy};
pub use transport::{HttpTransport, ReqwestTransport};
pub use uri::RequestUri;
