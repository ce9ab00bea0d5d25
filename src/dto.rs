use serde::{Deserialize, Serialize};

/// Schema-less payload: field order is kept as received.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub const SEARCH_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReq {
    pub query: String,
    pub size: usize,
    pub include_total_count: bool,
}

impl SearchReq {
    pub fn first_page(query: String) -> Self {
        Self {
            query,
            size: SEARCH_PAGE_SIZE,
            include_total_count: true,
        }
    }
}

pub type Score = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument<D = Document> {
    pub score: Score,
    pub doc: D,
}

#[derive(Debug, Default)]
pub struct SearchResp {
    pub total_count: Option<u64>,
    pub docs: Vec<ScoredDocument>,
}
