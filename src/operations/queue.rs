//! Queue operations.

use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::HashMap;

use super::{service_uri, set_header};
use crate::config::AccountSettings;
use crate::error::{StorageError, StorageResult};
use crate::metadata;
use crate::models::QueueMessage;
use crate::request::{Operation, ResponsePayload, ServiceType};
use crate::uri::RequestUri;
use crate::xml::{parse_queue_messages, serialize_queue_message};

/// Most messages one Get Messages call can return.
pub const MAX_MESSAGES_PER_GET: u8 = 32;

fn messages_uri(settings: &AccountSettings, queue: &str) -> RequestUri {
    service_uri(settings, ServiceType::Queue)
        .segment(queue)
        .segment("messages")
}

impl ResponsePayload for QueueMessage {
    const EXPECTS_BODY: bool = true;

    fn from_headers(_headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self::default())
    }

    fn parse_body(&mut self, body: Bytes) -> StorageResult<()> {
        *self = parse_queue_messages(&String::from_utf8_lossy(&body))?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::general("response contained no queue message"))?;
        Ok(())
    }
}

impl ResponsePayload for Vec<QueueMessage> {
    const EXPECTS_BODY: bool = true;

    fn from_headers(_headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Vec::new())
    }

    fn parse_body(&mut self, body: Bytes) -> StorageResult<()> {
        *self = parse_queue_messages(&String::from_utf8_lossy(&body))?;
        Ok(())
    }
}

/// Creates a queue.
#[derive(Debug, Clone, Default)]
pub struct CreateQueue {
    pub name: String,
    pub metadata: HashMap<String, String>,
}

impl CreateQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Operation for CreateQueue {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Queue
    }

    fn method(&self) -> Method {
        Method::PUT
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Queue).segment(&self.name)
    }

    fn optional_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        metadata::apply(headers, &self.metadata)
    }
}

/// Deletes a queue and every message in it.
#[derive(Debug, Clone)]
pub struct DeleteQueue {
    pub name: String,
}

impl DeleteQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for DeleteQueue {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Queue
    }

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Queue).segment(&self.name)
    }
}

/// Adds a message to the back of a queue.
#[derive(Debug, Clone)]
pub struct PutMessage {
    pub queue: String,
    pub text: String,
    /// Seconds before the message becomes visible.
    pub visibility_timeout: Option<u32>,
    /// Seconds the message lives; -1 never expires.
    pub time_to_live: Option<i64>,
}

impl PutMessage {
    pub fn new(queue: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            text: text.into(),
            visibility_timeout: None,
            time_to_live: None,
        }
    }

    pub fn visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn time_to_live(mut self, seconds: i64) -> Self {
        self.time_to_live = Some(seconds);
        self
    }
}

impl Operation for PutMessage {
    type Payload = QueueMessage;

    fn service(&self) -> ServiceType {
        ServiceType::Queue
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        messages_uri(settings, &self.queue)
            .optional_parameter("visibilitytimeout", self.visibility_timeout)
            .optional_parameter("messagettl", self.time_to_live)
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        set_header(headers, "content-type", "application/xml")
    }

    fn body(&self) -> StorageResult<Option<Bytes>> {
        Ok(Some(Bytes::from(serialize_queue_message(&self.text))))
    }
}

/// Retrieves messages from the front of a queue.
///
/// Retrieved messages become invisible for the visibility timeout unless
/// `peek_only` is set, in which case they stay visible and carry no pop
/// receipt.
#[derive(Debug, Clone)]
pub struct GetMessages {
    pub queue: String,
    pub number_of_messages: Option<u8>,
    pub visibility_timeout: Option<u32>,
    pub peek_only: bool,
}

impl GetMessages {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            number_of_messages: None,
            visibility_timeout: None,
            peek_only: false,
        }
    }

    /// Messages to retrieve, capped at [`MAX_MESSAGES_PER_GET`].
    pub fn number_of_messages(mut self, count: u8) -> Self {
        self.number_of_messages = Some(count.clamp(1, MAX_MESSAGES_PER_GET));
        self
    }

    pub fn visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = Some(seconds);
        self
    }

    pub fn peek_only(mut self) -> Self {
        self.peek_only = true;
        self
    }
}

impl Operation for GetMessages {
    type Payload = Vec<QueueMessage>;

    fn service(&self) -> ServiceType {
        ServiceType::Queue
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        let uri = messages_uri(settings, &self.queue)
            .optional_parameter("numofmessages", self.number_of_messages);

        if self.peek_only {
            uri.parameter("peekonly", "true")
        } else {
            uri.optional_parameter("visibilitytimeout", self.visibility_timeout)
        }
    }
}

/// Deletes a retrieved message using its pop receipt.
#[derive(Debug, Clone)]
pub struct DeleteMessage {
    pub queue: String,
    pub message_id: String,
    pub pop_receipt: String,
}

impl DeleteMessage {
    pub fn new(
        queue: impl Into<String>,
        message_id: impl Into<String>,
        pop_receipt: impl Into<String>,
    ) -> Self {
        Self {
            queue: queue.into(),
            message_id: message_id.into(),
            pop_receipt: pop_receipt.into(),
        }
    }
}

impl Operation for DeleteMessage {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Queue
    }

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        messages_uri(settings, &self.queue)
            .segment(&self.message_id)
            .parameter("popreceipt", &self.pop_receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_messages_uri() {
        let settings = AccountSettings::development();

        let uri = GetMessages::new("jobs")
            .number_of_messages(200)
            .visibility_timeout(30)
            .uri(&settings);
        assert_eq!(
            uri.uri_string(),
            "http://127.0.0.1:10001/devstoreaccount1/jobs/messages?numofmessages=32&visibilitytimeout=30"
        );

        let uri = GetMessages::new("jobs")
            .visibility_timeout(30)
            .peek_only()
            .uri(&settings);
        assert_eq!(
            uri.uri_string(),
            "http://127.0.0.1:10001/devstoreaccount1/jobs/messages?peekonly=true"
        );
    }

    #[test]
    fn test_delete_message_encodes_pop_receipt() {
        let settings = AccountSettings::development();
        let uri = DeleteMessage::new("jobs", "abc", "AgAAAA+/=").uri(&settings);

        assert_eq!(uri.parameters()["popreceipt"], "AgAAAA+/=");
        assert!(uri.uri_string().ends_with("/jobs/messages/abc?popreceipt=AgAAAA%2B%2F%3D"));
    }

    #[test]
    fn test_put_message_body() {
        let op = PutMessage::new("jobs", "a < b").time_to_live(-1);
        let body = op.body().unwrap().unwrap();
        assert!(std::str::from_utf8(&body)
            .unwrap()
            .contains("<MessageText>a &lt; b</MessageText>"));
        assert_eq!(op.uri(&AccountSettings::development()).parameters()["messagettl"], "-1");
    }

    #[test]
    fn test_put_message_payload_takes_first_message() {
        let mut message = QueueMessage::from_headers(&HeaderMap::new()).unwrap();
        message
            .parse_body(Bytes::from_static(
                b"<QueueMessagesList><QueueMessage><MessageId>m1</MessageId><PopReceipt>r1</PopReceipt></QueueMessage></QueueMessagesList>",
            ))
            .unwrap();
        assert_eq!(message.message_id, "m1");
        assert_eq!(message.pop_receipt.as_deref(), Some("r1"));
        assert_eq!(message.message_text, None);

        let mut empty = QueueMessage::default();
        assert!(empty.parse_body(Bytes::from_static(b"<QueueMessagesList />")).is_err());
    }
}
