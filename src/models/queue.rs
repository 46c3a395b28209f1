//! Queue data models.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::context::parse_http_date;

/// A message returned by Put Message, Get Messages or Peek Messages.
///
/// Put Message responses carry no `MessageText`, and peeked messages carry
/// no pop receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(
        rename = "InsertionTime",
        default,
        deserialize_with = "http_date_opt"
    )]
    pub insertion_time: Option<DateTime<Utc>>,
    #[serde(
        rename = "ExpirationTime",
        default,
        deserialize_with = "http_date_opt"
    )]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(rename = "PopReceipt", default)]
    pub pop_receipt: Option<String>,
    #[serde(
        rename = "TimeNextVisible",
        default,
        deserialize_with = "http_date_opt"
    )]
    pub time_next_visible: Option<DateTime<Utc>>,
    #[serde(rename = "DequeueCount", default)]
    pub dequeue_count: Option<u32>,
    #[serde(rename = "MessageText", default)]
    pub message_text: Option<String>,
}

/// `<QueueMessagesList>` response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct QueueMessagesList {
    #[serde(rename = "QueueMessage", default)]
    pub messages: Vec<QueueMessage>,
}

fn http_date_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_http_date(s.trim())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid HTTP date '{}'", s))),
        _ => Ok(None),
    }
}
