//! Table data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A table entity in the `odata=nometadata` JSON format.
///
/// Every property other than the two keys lands in `properties`, including
/// the service-maintained `Timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: Map::new(),
        }
    }

    /// Adds a property.
    ///
    /// `PartitionKey` and `RowKey` replace the entity's keys instead of being
    /// added as a second, conflicting property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "PartitionKey" => self.partition_key = key_string(value),
            "RowKey" => self.row_key = key_string(value),
            _ => {
                self.properties.insert(name, value);
            }
        }
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

fn key_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Body of a Create Table request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TableName<'a> {
    #[serde(rename = "TableName")]
    pub table_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_flattens_properties() {
        let entity = TableEntity::new("pk", "rk")
            .with_property("Age", 42)
            .with_property("Name", "Ada");

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            value,
            json!({"PartitionKey": "pk", "RowKey": "rk", "Age": 42, "Name": "Ada"})
        );

        let parsed: TableEntity = serde_json::from_value(json!({
            "PartitionKey": "pk",
            "RowKey": "rk",
            "Timestamp": "2024-01-01T00:00:00Z",
            "Age": 42
        }))
        .unwrap();
        assert_eq!(parsed.partition_key, "pk");
        assert_eq!(parsed.property("Age"), Some(&json!(42)));
        assert!(parsed.property("Timestamp").is_some());
    }

    #[test]
    fn test_key_names_replace_keys() {
        let entity = TableEntity::new("pk", "rk")
            .with_property("PartitionKey", "other-pk")
            .with_property("RowKey", 7)
            .with_property("Age", 42);

        assert_eq!(entity.partition_key, "other-pk");
        assert_eq!(entity.row_key, "7");
        assert!(entity.property("PartitionKey").is_none());

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            value,
            json!({"PartitionKey": "other-pk", "RowKey": "7", "Age": 42})
        );
    }
}
