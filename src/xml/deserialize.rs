//! XML response deserialization.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

use crate::context::parse_http_date;
use crate::error::{StorageError, StorageResult};
use crate::models::{
    ContainerItem, ContainerList, LeaseState, LeaseStatus, PublicAccessLevel, QueueMessage,
    QueueMessagesList,
};

/// Code, message and any extra elements of an `<Error>` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

fn malformed(err: quick_xml::Error) -> StorageError {
    StorageError::general_with("malformed XML in response body", err)
}

/// Parses `<Error><Code/><Message/>...</Error>`.
///
/// Leaf elements other than `Code` and `Message` are kept in `details`
/// under their own element name, however deeply they are nested
/// (`<AdditionalDetail><AuthenticationErrorDetail>` lands under
/// `AuthenticationErrorDetail`). Wrapper elements are not recorded.
pub fn parse_error_body(xml: &str) -> StorageResult<ErrorBody> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut body = ErrorBody::default();
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current_text = String::new();
    let mut leaf = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                current_text.clear();
                leaf = true;
            }
            Ok(Event::End(_)) => {
                let path_str: Vec<&str> = path.iter().map(|s| s.as_str()).collect();

                match path_str.as_slice() {
                    ["Error", "Code"] => body.code = current_text.clone(),
                    ["Error", "Message"] => body.message = current_text.clone(),
                    ["Error", .., name] if leaf => {
                        body.details.insert(name.to_string(), current_text.clone());
                    }
                    _ => {}
                }

                path.pop();
                current_text.clear();
                leaf = false;
            }
            Ok(Event::Text(e)) => {
                current_text = e.unescape().map_err(malformed)?.to_string();
            }
            Ok(Event::CData(e)) => {
                current_text = String::from_utf8_lossy(&e.into_inner()).to_string();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(body)
}

/// Parses a List Containers `<EnumerationResults>` body.
pub fn parse_container_list(xml: &str) -> StorageResult<ContainerList> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut list = ContainerList::default();
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current_text = String::new();
    let mut container = ContainerItem::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                current_text.clear();
            }
            Ok(Event::End(_)) => {
                let path_str: Vec<&str> = path.iter().map(|s| s.as_str()).collect();
                let props = &mut container.properties;

                match path_str.as_slice() {
                    [_, "Prefix"] => list.prefix = Some(current_text.clone()),
                    [_, "Marker"] => list.marker = Some(current_text.clone()),
                    [_, "MaxResults"] => list.max_results = current_text.parse().ok(),
                    [_, "NextMarker"] => {
                        if !current_text.is_empty() {
                            list.next_marker = Some(current_text.clone());
                        }
                    }
                    [_, "Containers", "Container", "Name"] => {
                        container.name = current_text.clone();
                    }
                    [_, "Containers", "Container", "Properties", field] => match *field {
                        "Last-Modified" => props.last_modified = parse_http_date(&current_text),
                        "Etag" => props.etag = Some(current_text.clone()),
                        "LeaseStatus" => {
                            props.lease_status =
                                LeaseStatus::from_str(&current_text).unwrap_or_default();
                        }
                        "LeaseState" => {
                            props.lease_state =
                                LeaseState::from_str(&current_text).unwrap_or_default();
                        }
                        "PublicAccess" => {
                            props.public_access =
                                PublicAccessLevel::from_str(&current_text).unwrap_or_default();
                        }
                        "HasImmutabilityPolicy" => {
                            props.has_immutability_policy = current_text == "true";
                        }
                        "HasLegalHold" => props.has_legal_hold = current_text == "true",
                        _ => {}
                    },
                    [_, "Containers", "Container", "Metadata", key] => {
                        props.metadata.insert(key.to_lowercase(), current_text.clone());
                    }
                    [_, "Containers", "Container"] => {
                        list.containers.push(std::mem::take(&mut container));
                    }
                    _ => {}
                }

                path.pop();
                current_text.clear();
            }
            Ok(Event::Text(e)) => {
                current_text = e.unescape().map_err(malformed)?.to_string();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(list)
}

/// Parses a `<QueueMessagesList>` body.
pub fn parse_queue_messages(xml: &str) -> StorageResult<Vec<QueueMessage>> {
    let xml = xml.trim_start_matches('\u{feff}').trim();
    if xml.is_empty() {
        return Ok(Vec::new());
    }

    let list: QueueMessagesList = quick_xml::de::from_str(xml)
        .map_err(|e| StorageError::general_with("malformed queue message list", e))?;
    Ok(list.messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicAccessLevel;

    #[test]
    fn test_parse_error_body() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Error>
  <Code>InvalidQueryParameterValue</Code>
  <Message>Value for one of the query parameters specified in the request URI is invalid.
RequestId:1234</Message>
  <QueryParameterName>popreceipt</QueryParameterName>
  <Reason>invalid receipt format</Reason>
</Error>"#;

        let body = parse_error_body(xml).unwrap();
        assert_eq!(body.code, "InvalidQueryParameterValue");
        assert!(body.message.starts_with("Value for one of the query parameters"));
        assert_eq!(body.details.len(), 2);
        assert_eq!(body.details["QueryParameterName"], "popreceipt");
        assert_eq!(body.details["Reason"], "invalid receipt format");
    }

    #[test]
    fn test_parse_error_body_nested_details() {
        let xml = "<Error><Code>AuthenticationFailed</Code><Message>Server failed to authenticate the request.</Message>\
<AdditionalDetail><AuthenticationErrorDetail>The MAC signature found in the HTTP request is not the same as any computed signature.</AuthenticationErrorDetail></AdditionalDetail></Error>";

        let body = parse_error_body(xml).unwrap();
        assert_eq!(body.code, "AuthenticationFailed");
        assert_eq!(body.details.len(), 1);
        assert!(body.details["AuthenticationErrorDetail"].starts_with("The MAC signature"));
        assert!(!body.details.contains_key("AdditionalDetail"));
    }

    #[test]
    fn test_parse_error_body_unescapes() {
        let body = parse_error_body("<Error><Code>X</Code><Message>a &amp; b</Message></Error>")
            .unwrap();
        assert_eq!(body.message, "a & b");
    }

    #[test]
    fn test_parse_error_body_rejects_garbage() {
        assert!(parse_error_body("<Error><Code>X</Message></Error>").is_err());
    }

    #[test]
    fn test_parse_container_list() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="http://127.0.0.1:10000/devstoreaccount1/">
  <Prefix>log</Prefix>
  <MaxResults>2</MaxResults>
  <Containers>
    <Container>
      <Name>logs-2024</Name>
      <Properties>
        <Last-Modified>Mon, 01 Jan 2024 00:00:00 GMT</Last-Modified>
        <Etag>"0x8DC0A"</Etag>
        <LeaseStatus>unlocked</LeaseStatus>
        <LeaseState>available</LeaseState>
        <PublicAccess>blob</PublicAccess>
        <HasImmutabilityPolicy>false</HasImmutabilityPolicy>
        <HasLegalHold>false</HasLegalHold>
      </Properties>
      <Metadata>
        <Owner>ops</Owner>
      </Metadata>
    </Container>
    <Container>
      <Name>logs-2025</Name>
      <Properties>
        <Etag>"0x8DC0B"</Etag>
        <LeaseStatus>locked</LeaseStatus>
        <LeaseState>leased</LeaseState>
      </Properties>
    </Container>
  </Containers>
  <NextMarker>/devstoreaccount1/logs-2026</NextMarker>
</EnumerationResults>"#;

        let list = parse_container_list(xml).unwrap();
        assert_eq!(list.prefix.as_deref(), Some("log"));
        assert_eq!(list.max_results, Some(2));
        assert_eq!(list.next_marker.as_deref(), Some("/devstoreaccount1/logs-2026"));
        assert_eq!(list.containers.len(), 2);

        let first = &list.containers[0];
        assert_eq!(first.name, "logs-2024");
        assert_eq!(first.properties.etag.as_deref(), Some("\"0x8DC0A\""));
        assert!(first.properties.last_modified.is_some());
        assert_eq!(first.properties.public_access, PublicAccessLevel::Blob);
        assert_eq!(first.properties.metadata["owner"], "ops");

        let second = &list.containers[1];
        assert_eq!(second.properties.lease_status, LeaseStatus::Locked);
        assert_eq!(second.properties.lease_state, LeaseState::Leased);
        assert!(second.properties.metadata.is_empty());
    }

    #[test]
    fn test_parse_empty_container_list() {
        let xml = r#"<EnumerationResults><Containers /><NextMarker /></EnumerationResults>"#;
        let list = parse_container_list(xml).unwrap();
        assert!(list.containers.is_empty());
        assert_eq!(list.next_marker, None);
    }

    #[test]
    fn test_parse_queue_messages() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<QueueMessagesList>
  <QueueMessage>
    <MessageId>5974b586-0df3-4e2d-ad0c-18e3892bfca2</MessageId>
    <InsertionTime>Fri, 09 Oct 2009 21:04:30 GMT</InsertionTime>
    <ExpirationTime>Fri, 16 Oct 2009 21:04:30 GMT</ExpirationTime>
    <PopReceipt>YzQ4Yzg1MDItYTc0Ny00OWNjLTkxYTUtZGM0MDFiZDAwYzEw</PopReceipt>
    <TimeNextVisible>Fri, 09 Oct 2009 23:29:20 GMT</TimeNextVisible>
    <DequeueCount>1</DequeueCount>
    <MessageText>hello &amp; goodbye</MessageText>
  </QueueMessage>
</QueueMessagesList>"#;

        let messages = parse_queue_messages(xml).unwrap();
        assert_eq!(messages.len(), 1);

        let message = &messages[0];
        assert_eq!(message.message_id, "5974b586-0df3-4e2d-ad0c-18e3892bfca2");
        assert_eq!(
            message.pop_receipt.as_deref(),
            Some("YzQ4Yzg1MDItYTc0Ny00OWNjLTkxYTUtZGM0MDFiZDAwYzEw")
        );
        assert_eq!(message.dequeue_count, Some(1));
        assert_eq!(message.message_text.as_deref(), Some("hello & goodbye"));
        assert!(message.time_next_visible.is_some());
        assert_eq!(
            message.insertion_time,
            parse_http_date("Fri, 09 Oct 2009 21:04:30 GMT")
        );
    }

    #[test]
    fn test_parse_empty_queue_messages() {
        assert!(parse_queue_messages("").unwrap().is_empty());
        assert!(parse_queue_messages("<QueueMessagesList />").unwrap().is_empty());
    }
}
