//! Table-store side of an update: one entity upserted into one table.

mod account;
mod client;
mod entity;

use async_trait::async_trait;
use thiserror::Error;

pub use account::{Credentials, StorageAccount};
pub use client::TableClient;
pub use entity::TableEntity;

/// Both halves of the key are literals, so every update lands on the same
/// logical record.
pub const FIXED_PARTITION_KEY: &str = "PartitionKey";
pub const FIXED_ROW_KEY: &str = "RowKey";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Network error talking to table storage: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Table storage returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid table storage request: {0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Creates the entity or merges its properties into the stored one,
    /// whatever version is currently stored.
    async fn insert_or_merge(&self, entity: TableEntity) -> Result<(), StorageError>;

    fn table_name(&self) -> &str;
}
