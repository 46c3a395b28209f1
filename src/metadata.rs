//! User metadata carried as `x-ms-meta-<key>` headers.

use http::{HeaderMap, HeaderName};
use std::collections::{HashMap, HashSet};

use crate::context::header_value;
use crate::error::{StorageError, StorageResult};

/// Prefix of every user metadata header.
pub const METADATA_PREFIX: &str = "x-ms-meta-";

/// Writes one `x-ms-meta-<key>` header per metadata entry.
///
/// Header names are case-insensitive, so keys are sent lower-cased and come
/// back lower-cased from [`extract`]. Two keys that only differ by case are
/// rejected.
pub fn apply(headers: &mut HeaderMap, metadata: &HashMap<String, String>) -> StorageResult<()> {
    let mut seen = HashSet::with_capacity(metadata.len());
    for (key, value) in metadata {
        if key.is_empty() {
            return Err(StorageError::config("metadata keys cannot be empty"));
        }

        let lowered = key.to_lowercase();
        if !seen.insert(lowered.clone()) {
            return Err(StorageError::config(format!(
                "metadata key '{}' collides with another key that differs only by case",
                key
            )));
        }

        let name = format!("{}{}", METADATA_PREFIX, lowered);
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            StorageError::general_with(format!("invalid metadata key '{}'", key), e)
        })?;
        headers.insert(name, header_value(key, value)?);
    }
    Ok(())
}

/// Reads metadata back from response headers, stripping the prefix.
pub fn extract(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name_str = name.as_str();
            if let Some(key) = name_str.strip_prefix(METADATA_PREFIX) {
                value.to_str().ok().map(|v| (key.to_string(), v.to_string()))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_metadata_round_trip() {
        let metadata: HashMap<String, String> = [
            ("owner", "team-a"),
            ("purpose", "integration tests"),
            ("empty", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static("2021-10-04"));
        apply(&mut headers, &metadata).unwrap();

        assert_eq!(headers["x-ms-meta-owner"], "team-a");
        assert_eq!(extract(&headers), metadata);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let mut headers = HeaderMap::new();

        let empty = HashMap::from([(String::new(), "v".to_string())]);
        assert!(apply(&mut headers, &empty).is_err());

        let spaced = HashMap::from([("has space".to_string(), "v".to_string())]);
        assert!(apply(&mut headers, &spaced).is_err());
    }

    #[test]
    fn test_keys_differing_by_case_rejected() {
        let metadata = HashMap::from([
            ("Owner".to_string(), "a".to_string()),
            ("owner".to_string(), "b".to_string()),
        ]);

        let mut headers = HeaderMap::new();
        let err = apply(&mut headers, &metadata).unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_mixed_case_key_comes_back_lowercased() {
        let metadata = HashMap::from([("Owner".to_string(), "team-a".to_string())]);

        let mut headers = HeaderMap::new();
        apply(&mut headers, &metadata).unwrap();

        let extracted = extract(&headers);
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted["owner"], "team-a");
    }
}
