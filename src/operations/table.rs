//! Table operations, using the JSON `odata=nometadata` format.

use bytes::Bytes;
use http::{HeaderMap, Method};

use super::{service_uri, set_header};
use crate::config::AccountSettings;
use crate::error::{StorageError, StorageResult};
use crate::models::{TableEntity, TableName};
use crate::request::{Operation, ResponsePayload, ServiceType};
use crate::uri::RequestUri;

const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";

/// Headers every Table request carries.
fn odata_headers(headers: &mut HeaderMap) -> StorageResult<()> {
    set_header(headers, "accept", ACCEPT_NO_METADATA)?;
    set_header(headers, "dataserviceversion", DATA_SERVICE_VERSION)?;
    set_header(headers, "maxdataserviceversion", DATA_SERVICE_VERSION)
}

/// Headers for a request with a JSON body whose echo is not wanted back.
fn json_body_headers(headers: &mut HeaderMap) -> StorageResult<()> {
    odata_headers(headers)?;
    set_header(headers, "content-type", mime::APPLICATION_JSON.as_ref())?;
    set_header(headers, "prefer", "return-no-content")
}

fn to_json<T: serde::Serialize>(value: &T) -> StorageResult<Option<Bytes>> {
    let body = serde_json::to_vec(value)
        .map_err(|e| StorageError::general_with("failed to serialize table request body", e))?;
    Ok(Some(Bytes::from(body)))
}

/// Quotes a key for use inside an OData key predicate.
fn quote_key(key: &str) -> String {
    format!("'{}'", key.replace('\'', "''"))
}

impl ResponsePayload for TableEntity {
    const EXPECTS_BODY: bool = true;

    fn from_headers(_headers: &HeaderMap) -> StorageResult<Self> {
        Ok(Self::default())
    }

    fn parse_body(&mut self, body: Bytes) -> StorageResult<()> {
        *self = serde_json::from_slice(&body)
            .map_err(|e| StorageError::general_with("malformed table entity", e))?;
        Ok(())
    }
}

/// Creates a table.
#[derive(Debug, Clone)]
pub struct CreateTable {
    pub name: String,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for CreateTable {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Table
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Table).segment("Tables")
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        json_body_headers(headers)
    }

    fn body(&self) -> StorageResult<Option<Bytes>> {
        to_json(&TableName {
            table_name: &self.name,
        })
    }
}

/// Deletes a table.
#[derive(Debug, Clone)]
pub struct DeleteTable {
    pub name: String,
}

impl DeleteTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Operation for DeleteTable {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Table
    }

    fn method(&self) -> Method {
        Method::DELETE
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Table)
            .segment(format!("Tables({})", quote_key(&self.name)))
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        odata_headers(headers)
    }
}

/// Inserts an entity into a table.
#[derive(Debug, Clone)]
pub struct InsertEntity {
    pub table: String,
    pub entity: TableEntity,
}

impl InsertEntity {
    pub fn new(table: impl Into<String>, entity: TableEntity) -> Self {
        Self {
            table: table.into(),
            entity,
        }
    }
}

impl Operation for InsertEntity {
    type Payload = ();

    fn service(&self) -> ServiceType {
        ServiceType::Table
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Table).segment(&self.table)
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        json_body_headers(headers)
    }

    fn body(&self) -> StorageResult<Option<Bytes>> {
        to_json(&self.entity)
    }
}

/// Reads one entity by partition and row key.
#[derive(Debug, Clone)]
pub struct GetEntity {
    pub table: String,
    pub partition_key: String,
    pub row_key: String,
}

impl GetEntity {
    pub fn new(
        table: impl Into<String>,
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl Operation for GetEntity {
    type Payload = TableEntity;

    fn service(&self) -> ServiceType {
        ServiceType::Table
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn uri(&self, settings: &AccountSettings) -> RequestUri {
        service_uri(settings, ServiceType::Table).segment(format!(
            "{}(PartitionKey={},RowKey={})",
            self.table,
            quote_key(&self.partition_key),
            quote_key(&self.row_key)
        ))
    }

    fn required_headers(&self, headers: &mut HeaderMap) -> StorageResult<()> {
        odata_headers(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_request() {
        let op = CreateTable::new("orders");
        let mut headers = HeaderMap::new();
        op.required_headers(&mut headers).unwrap();

        assert_eq!(headers["accept"], ACCEPT_NO_METADATA);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["prefer"], "return-no-content");
        assert_eq!(headers["dataserviceversion"], "3.0;NetFx");
        assert_eq!(op.body().unwrap().unwrap().as_ref(), br#"{"TableName":"orders"}"#);
        assert_eq!(
            op.uri(&AccountSettings::development()).uri_string(),
            "http://127.0.0.1:10002/devstoreaccount1/Tables"
        );
    }

    #[test]
    fn test_unserializable_body_is_an_error() {
        use std::collections::HashMap;

        // JSON object keys must be strings.
        let value = HashMap::from([((1, 2), 3)]);
        let err = to_json(&value).unwrap_err();
        assert!(matches!(err, StorageError::General { .. }));
    }

    #[test]
    fn test_delete_table_uri() {
        let uri = DeleteTable::new("orders").uri(&AccountSettings::development());
        assert_eq!(
            uri.uri_string(),
            "http://127.0.0.1:10002/devstoreaccount1/Tables('orders')"
        );
    }

    #[test]
    fn test_get_entity_uri_quotes_keys() {
        let uri = GetEntity::new("orders", "o'brien", "row 1").uri(&AccountSettings::development());
        assert_eq!(
            uri.uri_string(),
            "http://127.0.0.1:10002/devstoreaccount1/orders(PartitionKey='o''brien',RowKey='row%201')"
        );
    }

    #[test]
    fn test_entity_payload() {
        let mut entity = TableEntity::from_headers(&HeaderMap::new()).unwrap();
        entity
            .parse_body(Bytes::from_static(
                br#"{"PartitionKey":"pk","RowKey":"rk","Qty":3}"#,
            ))
            .unwrap();
        assert_eq!(entity.row_key, "rk");
        assert_eq!(entity.property("Qty"), Some(&serde_json::json!(3)));

        assert!(entity.parse_body(Bytes::from_static(b"not json")).is_err());
    }
}
