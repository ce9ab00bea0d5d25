//! In-memory collaborators that record every call.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dto::{Document, ScoredDocument, SearchReq, SearchResp};
use crate::search::{SearchError, SearchIndex};
use crate::storage::{StorageError, TableEntity, TableStore};
use crate::AppState;

#[derive(Default)]
pub struct RecordingTable {
    pub writes: Mutex<Vec<TableEntity>>,
    pub fail: bool,
}

impl RecordingTable {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> Vec<TableEntity> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableStore for RecordingTable {
    async fn insert_or_merge(&self, entity: TableEntity) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push(entity);
        if self.fail {
            return Err(StorageError::Api {
                status: 503,
                message: "ServerBusy: storage account is throttled".to_string(),
            });
        }
        Ok(())
    }

    fn table_name(&self) -> &str {
        "dataIndexTable"
    }
}

#[derive(Default)]
pub struct RecordingIndex {
    pub uploads: Mutex<Vec<Vec<Document>>>,
    pub queries: Mutex<Vec<SearchReq>>,
    pub hits: Vec<Document>,
    pub fail: bool,
}

impl RecordingIndex {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_hits(hits: Vec<Document>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<Vec<Document>> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<SearchReq> {
        self.queries.lock().unwrap().clone()
    }

    fn failure() -> SearchError {
        SearchError::Api {
            status: 503,
            message: "search-svc-7f3a unavailable".to_string(),
        }
    }
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn upload_documents(&self, docs: Vec<Document>) -> Result<(), SearchError> {
        self.uploads.lock().unwrap().push(docs);
        if self.fail {
            return Err(Self::failure());
        }
        Ok(())
    }

    async fn search(&self, req: SearchReq) -> Result<SearchResp, SearchError> {
        let size = req.size;
        self.queries.lock().unwrap().push(req);
        if self.fail {
            return Err(Self::failure());
        }
        let docs = self
            .hits
            .iter()
            .take(size)
            .cloned()
            .map(|doc| ScoredDocument { score: 1.0, doc })
            .collect();
        Ok(SearchResp {
            total_count: Some(self.hits.len() as u64),
            docs,
        })
    }

    fn index_name(&self) -> &str {
        "my-index"
    }
}

pub fn make_test_state(table: Arc<RecordingTable>, index: Arc<RecordingIndex>) -> AppState {
    AppState {
        api: crate::config::Api {
            listen: "127.0.0.1:0".parse().unwrap(),
            function_key: None,
            max_body_bytes: crate::config::DEFAULT_MAX_BODY_BYTES,
        },
        table,
        index,
    }
}

pub fn doc(value: serde_json::Value) -> Document {
    serde_json::from_value(value).unwrap()
}
