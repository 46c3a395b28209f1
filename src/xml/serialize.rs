//! XML request body serialization.

/// Escapes special XML characters.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serializes the body of a Put Message request.
pub fn serialize_queue_message(text: &str) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    xml.push_str("<QueueMessage>");
    xml.push_str(&format!("<MessageText>{}</MessageText>", xml_escape(text)));
    xml.push_str("</QueueMessage>");
    xml
}
