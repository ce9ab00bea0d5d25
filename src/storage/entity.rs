use serde_json::{Number, Value};

use crate::dto::Document;

const SYSTEM_PROPERTIES: [&str; 3] = ["PartitionKey", "RowKey", "Timestamp"];
const TYPE_ANNOTATION_SUFFIX: &str = "@odata.type";

#[derive(Debug, Clone, PartialEq)]
pub struct TableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub properties: Document,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>, properties: Document) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties,
        }
    }

    /// Resource path segment, e.g. `PartitionKey='a',RowKey='b'`.
    pub fn key_predicate(&self) -> String {
        format!(
            "PartitionKey='{}',RowKey='{}'",
            escape_key(&self.partition_key),
            escape_key(&self.row_key)
        )
    }

    /// Entity body in `odata=nometadata` JSON. Property values the table
    /// cannot hold natively are typed or flattened:
    /// integers outside i32 become `Edm.Int64`, nulls are dropped,
    /// arrays and objects are stored as their JSON text.
    pub fn to_odata(&self) -> Document {
        let mut body = Document::new();
        body.insert("PartitionKey".to_string(), Value::String(self.partition_key.clone()));
        body.insert("RowKey".to_string(), Value::String(self.row_key.clone()));

        for (name, value) in &self.properties {
            // Type annotations are derived from the values, never taken from the payload.
            if SYSTEM_PROPERTIES.contains(&name.as_str()) || name.ends_with(TYPE_ANNOTATION_SUFFIX) {
                continue;
            }
            match value {
                Value::Null => {}
                Value::Bool(_) | Value::String(_) => {
                    body.insert(name.clone(), value.clone());
                }
                Value::Number(number) => insert_number(&mut body, name, number),
                Value::Array(_) | Value::Object(_) => {
                    body.insert(name.clone(), Value::String(value.to_string()));
                }
            }
        }
        body
    }
}

fn insert_number(body: &mut Document, name: &str, number: &Number) {
    if let Some(int) = number.as_i64() {
        if i32::try_from(int).is_ok() {
            body.insert(name.to_string(), Value::Number(number.clone()));
        } else {
            body.insert(format!("{}{}", name, TYPE_ANNOTATION_SUFFIX), Value::from("Edm.Int64"));
            body.insert(name.to_string(), Value::String(int.to_string()));
        }
    } else {
        // u64 above i64::MAX has no table type; it degrades to a double like any float.
        body.insert(format!("{}{}", name, TYPE_ANNOTATION_SUFFIX), Value::from("Edm.Double"));
        body.insert(name.to_string(), Value::from(number.as_f64().unwrap_or_default()));
    }
}

fn escape_key(key: &str) -> String {
    key.replace('\'', "''")
}
