//! Search side: document upload and free-text queries against one index.

mod client;

use async_trait::async_trait;
use thiserror::Error;

use crate::dto::{Document, SearchReq, SearchResp};

pub use client::SearchClient;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search service configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error talking to the search service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Search service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Document '{key}' was rejected ({status}): {message}")]
    Rejected { key: String, status: u16, message: String },

    #[error("Invalid response from the search service: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Uploads `docs` as one batch of create-or-replace actions.
    async fn upload_documents(&self, docs: Vec<Document>) -> Result<(), SearchError>;

    async fn search(&self, req: SearchReq) -> Result<SearchResp, SearchError>;

    fn index_name(&self) -> &str;
}
