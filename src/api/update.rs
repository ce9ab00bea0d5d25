use actix_web::{web, HttpResponse};
use anyhow::anyhow;
use serde_json::Value;

use crate::dto::Document;
use crate::error;
use crate::storage::{TableEntity, FIXED_PARTITION_KEY, FIXED_ROW_KEY};
use crate::AppState;

/// Stores the posted object, then indexes it. The two writes are not
/// transactional: an indexing failure leaves the stored entity in place.
pub async fn update_data(state: web::Data<AppState>, body: web::Bytes) -> crate::Result<HttpResponse> {
    log::info!("Received data update request.");

    let doc = parse_document(&body)?;

    let entity = TableEntity::new(FIXED_PARTITION_KEY, FIXED_ROW_KEY, doc.clone());
    state
        .table
        .insert_or_merge(entity)
        .await
        .map_err(error::update_failed)?;
    log::info!("Data updated in table '{}'.", state.table.table_name());

    state
        .index
        .upload_documents(vec![doc])
        .await
        .map_err(error::update_failed)?;
    log::info!("Data indexed in '{}'.", state.index.index_name());

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Data updated and indexed successfully."))
}

fn parse_document(body: &[u8]) -> crate::Result<Document> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(error::empty_payload());
    }
    match serde_json::from_slice::<Value>(body).map_err(error::invalid_payload)? {
        Value::Object(doc) if !doc.is_empty() => Ok(doc),
        Value::Object(_) | Value::Null => Err(error::empty_payload()),
        other => Err(error::invalid_payload(anyhow!(
            "Expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
